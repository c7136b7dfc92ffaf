use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
pub use lp_common::Points;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatusType {
    /// The order has been accepted and stored, but no worker has picked it up yet.
    New,
    /// A worker is polling the accrual system for this order.
    Processing,
    /// The accrual system rejected the order. No points are awarded. Terminal.
    Invalid,
    /// The accrual system has awarded points for the order and they have been credited. Terminal.
    Processed,
}

impl OrderStatusType {
    /// Terminal orders never change status again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Invalid | Self::Processed)
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::New => write!(f, "NEW"),
            OrderStatusType::Processing => write!(f, "PROCESSING"),
            OrderStatusType::Invalid => write!(f, "INVALID"),
            OrderStatusType::Processed => write!(f, "PROCESSED"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid order status: {0}")]
pub struct ConversionError(String);

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NEW" => Ok(Self::New),
            "PROCESSING" => Ok(Self::Processing),
            "INVALID" => Ok(Self::Invalid),
            "PROCESSED" => Ok(Self::Processed),
            s => Err(ConversionError(s.to_string())),
        }
    }
}

//--------------------------------------    TerminalStatus     ---------------------------------------------------------
/// The final verdict of the accrual system for an order. This is the only input that settlement accepts, so a
/// non-terminal status can never be settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalStatus {
    Invalid,
    Processed(Points),
}

impl TerminalStatus {
    pub fn status(&self) -> OrderStatusType {
        match self {
            Self::Invalid => OrderStatusType::Invalid,
            Self::Processed(_) => OrderStatusType::Processed,
        }
    }

    pub fn accrual(&self) -> Option<Points> {
        match self {
            Self::Invalid => None,
            Self::Processed(p) => Some(*p),
        }
    }
}

impl Display for TerminalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Invalid => write!(f, "INVALID"),
            Self::Processed(p) => write!(f, "PROCESSED ({p})"),
        }
    }
}

//--------------------------------------        Order          ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Order {
    pub id: i64,
    /// The order number, as submitted by the user. Globally unique.
    pub number: String,
    pub user_id: i64,
    pub status: OrderStatusType,
    /// Only set once the order is `PROCESSED`.
    pub accrual: Option<Points>,
    /// The time the order was uploaded
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

//--------------------------------------       NewOrder        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    /// The normalized (whitespace-free) order number
    pub number: String,
    /// The user submitting the order
    pub user_id: i64,
}

impl NewOrder {
    pub fn new<S: Into<String>>(number: S, user_id: i64) -> Self {
        Self { number: number.into(), user_id }
    }
}

//--------------------------------------     UserAccount       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct UserAccount {
    pub id: i64,
    pub login: String,
    /// Spendable balance
    pub current_balance: Points,
    /// Lifetime total of all withdrawals
    pub withdrawn: Points,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------      Withdrawal       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Withdrawal {
    pub id: i64,
    /// The order number the points were spent against
    pub order_number: String,
    pub user_id: i64,
    pub amount: Points,
    pub processed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWithdrawal {
    pub order_number: String,
    pub user_id: i64,
    pub amount: Points,
}

impl NewWithdrawal {
    pub fn new<S: Into<String>>(user_id: i64, order_number: S, amount: Points) -> Self {
        Self { order_number: order_number.into(), user_id, amount }
    }
}
