use crate::db_types::{Order, UserAccount};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettlementResult {
    /// The order reached its terminal state in this call. `account` carries the owner's updated balance when points
    /// were credited, and is `None` for `INVALID` orders.
    Settled { order: Order, account: Option<UserAccount> },
    /// The order was already terminal. Nothing was written.
    AlreadySettled(Order),
}

impl SettlementResult {
    pub fn order(&self) -> &Order {
        match self {
            Self::Settled { order, .. } => order,
            Self::AlreadySettled(order) => order,
        }
    }

    pub fn is_already_settled(&self) -> bool {
        matches!(self, Self::AlreadySettled(_))
    }
}
