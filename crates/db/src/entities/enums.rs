//! String-backed active enums shared by the entities.
//!
//! Conversions to and from the core domain enums live here so repositories
//! never match on raw strings.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use bodega_core::cash::MovementKind;
use bodega_core::document::DocumentStatus as CoreDocumentStatus;
use bodega_core::order::{OrderState, PaymentKind};

/// Kind of a cash register movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum CashMovementKind {
    /// Cash placed in the drawer at session open.
    #[sea_orm(string_value = "opening_deposit")]
    OpeningDeposit,
    /// Cash removed at session close.
    #[sea_orm(string_value = "closing_withdrawal")]
    ClosingWithdrawal,
    /// Generic cash received.
    #[sea_orm(string_value = "inflow")]
    Inflow,
    /// Generic cash paid out.
    #[sea_orm(string_value = "outflow")]
    Outflow,
    /// Cash collected for a sale or an order payment.
    #[sea_orm(string_value = "sale_collection")]
    SaleCollection,
    /// Cash paid to a supplier.
    #[sea_orm(string_value = "supplier_payment")]
    SupplierPayment,
    /// Manual correction, signed.
    #[sea_orm(string_value = "adjustment")]
    Adjustment,
}

impl From<CashMovementKind> for MovementKind {
    fn from(kind: CashMovementKind) -> Self {
        match kind {
            CashMovementKind::OpeningDeposit => Self::OpeningDeposit,
            CashMovementKind::ClosingWithdrawal => Self::ClosingWithdrawal,
            CashMovementKind::Inflow => Self::Inflow,
            CashMovementKind::Outflow => Self::Outflow,
            CashMovementKind::SaleCollection => Self::SaleCollection,
            CashMovementKind::SupplierPayment => Self::SupplierPayment,
            CashMovementKind::Adjustment => Self::Adjustment,
        }
    }
}

impl From<MovementKind> for CashMovementKind {
    fn from(kind: MovementKind) -> Self {
        match kind {
            MovementKind::OpeningDeposit => Self::OpeningDeposit,
            MovementKind::ClosingWithdrawal => Self::ClosingWithdrawal,
            MovementKind::Inflow => Self::Inflow,
            MovementKind::Outflow => Self::Outflow,
            MovementKind::SaleCollection => Self::SaleCollection,
            MovementKind::SupplierPayment => Self::SupplierPayment,
            MovementKind::Adjustment => Self::Adjustment,
        }
    }
}

/// Kind of an inventory movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum InventoryMovementKind {
    /// Goods entering stock.
    #[sea_orm(string_value = "inbound")]
    Inbound,
    /// Goods leaving stock.
    #[sea_orm(string_value = "outbound")]
    Outbound,
    /// Manual correction, signed.
    #[sea_orm(string_value = "adjustment")]
    Adjustment,
}

/// Lifecycle state of a customer order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Being edited.
    #[sea_orm(string_value = "draft")]
    Draft,
    /// Accepted; holds stock.
    #[sea_orm(string_value = "confirmed")]
    Confirmed,
    /// Being picked.
    #[sea_orm(string_value = "in_preparation")]
    InPreparation,
    /// Ready for hand-over.
    #[sea_orm(string_value = "ready")]
    Ready,
    /// Goods delivered. Terminal.
    #[sea_orm(string_value = "delivered")]
    Delivered,
    /// Abandoned.
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl From<OrderStatus> for OrderState {
    fn from(status: OrderStatus) -> Self {
        match status {
            OrderStatus::Draft => Self::Draft,
            OrderStatus::Confirmed => Self::Confirmed,
            OrderStatus::InPreparation => Self::InPreparation,
            OrderStatus::Ready => Self::Ready,
            OrderStatus::Delivered => Self::Delivered,
            OrderStatus::Cancelled => Self::Cancelled,
        }
    }
}

impl From<OrderState> for OrderStatus {
    fn from(state: OrderState) -> Self {
        match state {
            OrderState::Draft => Self::Draft,
            OrderState::Confirmed => Self::Confirmed,
            OrderState::InPreparation => Self::InPreparation,
            OrderState::Ready => Self::Ready,
            OrderState::Delivered => Self::Delivered,
            OrderState::Cancelled => Self::Cancelled,
        }
    }
}

/// Kind of an order payment event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum PaymentEventKind {
    /// Money received against the order.
    #[sea_orm(string_value = "collection")]
    Collection,
    /// Money returned.
    #[sea_orm(string_value = "refund")]
    Refund,
}

impl From<PaymentEventKind> for PaymentKind {
    fn from(kind: PaymentEventKind) -> Self {
        match kind {
            PaymentEventKind::Collection => Self::Collection,
            PaymentEventKind::Refund => Self::Refund,
        }
    }
}

impl From<PaymentKind> for PaymentEventKind {
    fn from(kind: PaymentKind) -> Self {
        match kind {
            PaymentKind::Collection => Self::Collection,
            PaymentKind::Refund => Self::Refund,
        }
    }
}

/// Status of a stock/cash document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    /// In force.
    #[sea_orm(string_value = "registered")]
    Registered,
    /// Reversed. Terminal.
    #[sea_orm(string_value = "voided")]
    Voided,
}

impl From<DocumentStatus> for CoreDocumentStatus {
    fn from(status: DocumentStatus) -> Self {
        match status {
            DocumentStatus::Registered => Self::Registered,
            DocumentStatus::Voided => Self::Voided,
        }
    }
}

/// Direction of a return document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum ReturnKind {
    /// A client brings goods back: stock in, refund out.
    #[sea_orm(string_value = "sale_return")]
    SaleReturn,
    /// Goods go back to a supplier: stock out, cash in.
    #[sea_orm(string_value = "purchase_return")]
    PurchaseReturn,
}
