//! Initial schema: catalogs, ledgers, orders, and documents.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(CATALOG_SQL).await?;
        db.execute_unprepared(LEDGER_SQL).await?;
        db.execute_unprepared(ORDER_SQL).await?;
        db.execute_unprepared(DOCUMENT_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(
            r#"DROP TABLE IF EXISTS
                return_lines, "returns",
                purchase_receipt_lines, purchase_receipts,
                sale_lines, sales,
                order_payments, order_lines, reservations, customer_orders,
                inventory_movements, stock_units,
                cash_movements, register_sessions,
                payment_methods, units, products, clients, suppliers
            CASCADE;"#,
        )
        .await?;
        Ok(())
    }
}

const CATALOG_SQL: &str = r"
-- Read-only catalogs consumed by the ledgers and documents
CREATE TABLE products (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(255) NOT NULL,
    default_cost NUMERIC(14,4) CHECK (default_cost >= 0),
    active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE units (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    product_id UUID NOT NULL REFERENCES products(id) ON DELETE RESTRICT,
    name VARCHAR(255) NOT NULL,
    barcode VARCHAR(64) UNIQUE,
    default_cost NUMERIC(14,4) CHECK (default_cost >= 0),
    active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_units_product ON units(product_id);

CREATE TABLE payment_methods (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(100) NOT NULL,
    requires_reference BOOLEAN NOT NULL DEFAULT false,
    affects_cash_ledger BOOLEAN NOT NULL DEFAULT false,
    is_credit BOOLEAN NOT NULL DEFAULT false,
    active BOOLEAN NOT NULL DEFAULT true
);

CREATE TABLE clients (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(255) NOT NULL,
    active BOOLEAN NOT NULL DEFAULT true
);

CREATE TABLE suppliers (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(255) NOT NULL,
    active BOOLEAN NOT NULL DEFAULT true
);
";

const LEDGER_SQL: &str = r"
-- Cash register sessions and movements
CREATE TABLE register_sessions (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    opened_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    closed_at TIMESTAMPTZ,
    opening_float NUMERIC(14,2) NOT NULL CHECK (opening_float >= 0),
    declared_closing_amount NUMERIC(14,2),
    cashier VARCHAR(255) NOT NULL
);

-- At most one open session; the repository re-checks transactionally
CREATE UNIQUE INDEX uq_register_sessions_open
    ON register_sessions ((true)) WHERE closed_at IS NULL;

CREATE TABLE cash_movements (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    session_id UUID NOT NULL REFERENCES register_sessions(id) ON DELETE RESTRICT,
    occurred_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    kind TEXT NOT NULL,
    amount NUMERIC(14,2) NOT NULL,
    memo TEXT,
    document_ref VARCHAR(32),
    performed_by UUID
);

CREATE INDEX idx_cash_movements_session ON cash_movements(session_id, occurred_at);

-- Per-unit stock position
CREATE TABLE stock_units (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    unit_id UUID NOT NULL UNIQUE REFERENCES units(id) ON DELETE RESTRICT,
    on_hand INTEGER NOT NULL DEFAULT 0 CHECK (on_hand >= 0),
    minimum_threshold INTEGER CHECK (minimum_threshold >= 0),
    average_cost NUMERIC(14,4) NOT NULL DEFAULT 0 CHECK (average_cost >= 0)
);

CREATE TABLE inventory_movements (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    occurred_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    unit_id UUID NOT NULL REFERENCES units(id) ON DELETE RESTRICT,
    kind TEXT NOT NULL,
    quantity INTEGER NOT NULL CHECK (quantity <> 0),
    unit_cost NUMERIC(14,4) CHECK (unit_cost >= 0),
    document_ref VARCHAR(32),
    memo TEXT,
    performed_by UUID
);

CREATE INDEX idx_inventory_movements_unit ON inventory_movements(unit_id, occurred_at);
";

const ORDER_SQL: &str = r"
-- Customer orders, lines, payment events, reservations
CREATE TABLE customer_orders (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    number VARCHAR(32) NOT NULL UNIQUE,
    client_id UUID REFERENCES clients(id) ON DELETE RESTRICT,
    status TEXT NOT NULL DEFAULT 'draft',
    reserves_stock BOOLEAN NOT NULL DEFAULT true,
    total NUMERIC(14,2) NOT NULL DEFAULT 0 CHECK (total >= 0),
    notes TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_customer_orders_status ON customer_orders(status);

CREATE TABLE order_lines (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    order_id UUID NOT NULL REFERENCES customer_orders(id) ON DELETE CASCADE,
    unit_id UUID NOT NULL REFERENCES units(id) ON DELETE RESTRICT,
    quantity INTEGER NOT NULL CHECK (quantity > 0),
    unit_price NUMERIC(14,2) NOT NULL CHECK (unit_price >= 0),
    discount NUMERIC(14,2) NOT NULL DEFAULT 0 CHECK (discount >= 0)
);

CREATE INDEX idx_order_lines_order ON order_lines(order_id);

CREATE TABLE order_payments (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    order_id UUID NOT NULL REFERENCES customer_orders(id) ON DELETE RESTRICT,
    occurred_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    kind TEXT NOT NULL,
    amount NUMERIC(14,2) NOT NULL CHECK (amount > 0),
    payment_method_id UUID NOT NULL REFERENCES payment_methods(id) ON DELETE RESTRICT,
    reference VARCHAR(100),
    refund_of UUID REFERENCES order_payments(id) ON DELETE RESTRICT,
    performed_by UUID
);

CREATE INDEX idx_order_payments_order ON order_payments(order_id, occurred_at);

CREATE TABLE reservations (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    order_id UUID NOT NULL REFERENCES customer_orders(id) ON DELETE CASCADE,
    unit_id UUID NOT NULL REFERENCES units(id) ON DELETE RESTRICT,
    quantity INTEGER NOT NULL CHECK (quantity > 0),
    CONSTRAINT uq_reservations_order_unit UNIQUE (order_id, unit_id)
);

CREATE INDEX idx_reservations_unit ON reservations(unit_id);
";

const DOCUMENT_SQL: &str = r#"
-- Sales
CREATE TABLE sales (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    number VARCHAR(32) NOT NULL UNIQUE,
    occurred_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    client_id UUID REFERENCES clients(id) ON DELETE RESTRICT,
    payment_method_id UUID NOT NULL REFERENCES payment_methods(id) ON DELETE RESTRICT,
    status TEXT NOT NULL DEFAULT 'registered',
    total NUMERIC(14,2) NOT NULL CHECK (total >= 0),
    performed_by UUID,
    voided_at TIMESTAMPTZ
);

CREATE TABLE sale_lines (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    sale_id UUID NOT NULL REFERENCES sales(id) ON DELETE CASCADE,
    unit_id UUID NOT NULL REFERENCES units(id) ON DELETE RESTRICT,
    quantity INTEGER NOT NULL CHECK (quantity > 0),
    unit_price NUMERIC(14,2) NOT NULL CHECK (unit_price >= 0),
    discount NUMERIC(14,2) NOT NULL DEFAULT 0 CHECK (discount >= 0),
    unit_cost NUMERIC(14,4) NOT NULL CHECK (unit_cost >= 0)
);

CREATE INDEX idx_sale_lines_sale ON sale_lines(sale_id);

-- Purchase receipts
CREATE TABLE purchase_receipts (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    number VARCHAR(32) NOT NULL UNIQUE,
    occurred_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    supplier_id UUID NOT NULL REFERENCES suppliers(id) ON DELETE RESTRICT,
    payment_method_id UUID REFERENCES payment_methods(id) ON DELETE RESTRICT,
    order_reference VARCHAR(64),
    status TEXT NOT NULL DEFAULT 'registered',
    total NUMERIC(14,2) NOT NULL CHECK (total >= 0),
    performed_by UUID,
    voided_at TIMESTAMPTZ
);

CREATE TABLE purchase_receipt_lines (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    receipt_id UUID NOT NULL REFERENCES purchase_receipts(id) ON DELETE CASCADE,
    unit_id UUID NOT NULL REFERENCES units(id) ON DELETE RESTRICT,
    quantity INTEGER NOT NULL CHECK (quantity > 0),
    unit_cost NUMERIC(14,4) NOT NULL CHECK (unit_cost >= 0)
);

CREATE INDEX idx_purchase_receipt_lines_receipt ON purchase_receipt_lines(receipt_id);

-- Returns (both directions); the table name is a reserved word, keep it quoted
CREATE TABLE "returns" (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    number VARCHAR(32) NOT NULL UNIQUE,
    occurred_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    kind TEXT NOT NULL,
    client_id UUID REFERENCES clients(id) ON DELETE RESTRICT,
    supplier_id UUID REFERENCES suppliers(id) ON DELETE RESTRICT,
    payment_method_id UUID REFERENCES payment_methods(id) ON DELETE RESTRICT,
    status TEXT NOT NULL DEFAULT 'registered',
    total NUMERIC(14,2) NOT NULL CHECK (total >= 0),
    performed_by UUID,
    voided_at TIMESTAMPTZ
);

CREATE TABLE return_lines (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    return_id UUID NOT NULL REFERENCES "returns"(id) ON DELETE CASCADE,
    unit_id UUID NOT NULL REFERENCES units(id) ON DELETE RESTRICT,
    quantity INTEGER NOT NULL CHECK (quantity > 0),
    unit_price NUMERIC(14,2) NOT NULL DEFAULT 0 CHECK (unit_price >= 0),
    unit_cost NUMERIC(14,4) NOT NULL CHECK (unit_cost >= 0)
);

CREATE INDEX idx_return_lines_return ON return_lines(return_id);
"#;
