mod order_number;

pub use order_number::{
    is_valid_order_number,
    normalize_order_number,
    MAX_ORDER_NUMBER_LENGTH,
    MIN_ORDER_NUMBER_LENGTH,
};
