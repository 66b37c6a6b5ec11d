//! Order repository: checkout writes, order history and dashboard figures.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use sqlx::types::Json;

use freshdart_core::{
    DeliveryTimeSlot, OrderId, OrderItemId, OrderStatus, PaymentStatus, ProductId, ShippingType,
    UserId,
};

use super::RepositoryError;
use crate::models::order::{NewOrder, Order, OrderItem, OrderSummary, ShippingAddress};
use crate::models::pagination::{Cursor, Page};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i32,
    order_number: String,
    user_id: i32,
    status: OrderStatus,
    payment_status: PaymentStatus,
    subtotal: Decimal,
    shipping_cost: Decimal,
    tax: Decimal,
    total: Decimal,
    total_weight_kg: Decimal,
    shipping_type: ShippingType,
    delivery_date: NaiveDate,
    delivery_time_slot: String,
    delivery_notes: Option<String>,
    shipping_address: Json<ShippingAddress>,
    payment_method: String,
    payment_intent_id: Option<String>,
    created_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> Result<Order, RepositoryError> {
        let delivery_time_slot = self
            .delivery_time_slot
            .parse::<DeliveryTimeSlot>()
            .map_err(RepositoryError::DataCorruption)?;

        Ok(Order {
            id: OrderId::new(self.id),
            order_number: self.order_number,
            user_id: UserId::new(self.user_id),
            status: self.status,
            payment_status: self.payment_status,
            subtotal: self.subtotal,
            shipping_cost: self.shipping_cost,
            tax: self.tax,
            total: self.total,
            total_weight_kg: self.total_weight_kg,
            shipping_type: self.shipping_type,
            delivery_date: self.delivery_date,
            delivery_time_slot,
            delivery_notes: self.delivery_notes,
            shipping_address: self.shipping_address.0,
            payment_method: self.payment_method,
            payment_intent_id: self.payment_intent_id,
            items,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: i32,
    order_id: i32,
    product_id: Option<i32>,
    product_name: String,
    product_image: Option<String>,
    quantity: Decimal,
    unit_type: String,
    unit_price: Decimal,
    total_price: Decimal,
    weight_kg: Decimal,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        Self {
            id: OrderItemId::new(row.id),
            product_id: row.product_id.map(ProductId::new),
            product_name: row.product_name,
            product_image: row.product_image,
            quantity: row.quantity,
            unit_type: row.unit_type,
            unit_price: row.unit_price,
            total_price: row.total_price,
            weight_kg: row.weight_kg,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderSummaryRow {
    id: i32,
    order_number: String,
    status: OrderStatus,
    payment_status: PaymentStatus,
    total: Decimal,
    item_count: i64,
    delivery_date: NaiveDate,
    created_at: DateTime<Utc>,
}

impl From<OrderSummaryRow> for OrderSummary {
    fn from(row: OrderSummaryRow) -> Self {
        Self {
            id: OrderId::new(row.id),
            order_number: row.order_number,
            status: row.status,
            payment_status: row.payment_status,
            total: row.total,
            item_count: row.item_count,
            delivery_date: row.delivery_date,
            created_at: row.created_at,
        }
    }
}

const ORDER_SELECT: &str = r"
    SELECT id, order_number, user_id, status, payment_status, subtotal,
           shipping_cost, tax, total, total_weight_kg, shipping_type,
           delivery_date, delivery_time_slot, delivery_notes, shipping_address,
           payment_method, payment_intent_id, created_at
    FROM storefront.order
";

const SUMMARY_SELECT: &str = r"
    SELECT o.id, o.order_number, o.status, o.payment_status, o.total,
           o.delivery_date, o.created_at,
           (SELECT COUNT(*) FROM storefront.order_item i WHERE i.order_id = o.id) AS item_count
    FROM storefront.order o
";

// =============================================================================
// Dashboard figures
// =============================================================================

/// Order figures for a customer's dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct CustomerOrderStats {
    pub total_orders: i64,
    /// Orders not yet delivered or cancelled.
    pub active_orders: i64,
    /// Sum of paid order totals.
    pub total_spent: Decimal,
}

/// Marketplace-wide order figures for merchants.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct MerchantOrderStats {
    pub total_orders: i64,
    pub pending_orders: i64,
    /// Producers with at least one active product.
    pub active_suppliers: i64,
    /// Paid order totals since the start of the current month.
    pub monthly_revenue: Decimal,
}

/// Order figures for the lines containing a producer's products.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct ProducerOrderStats {
    pub pending_orders: i64,
    pub in_transit: i64,
    /// Paid line totals since the start of the current month.
    pub monthly_revenue: Decimal,
}

/// Repository for orders.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert an order and its lines in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the order number is taken.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, order: &NewOrder) -> Result<OrderId, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let order_id: i32 = sqlx::query_scalar(
            r"
            INSERT INTO storefront.order (
                order_number, user_id, subtotal, shipping_cost, tax, total,
                total_weight_kg, shipping_type, delivery_date, delivery_time_slot,
                delivery_notes, shipping_address, payment_method
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING id
            ",
        )
        .bind(&order.order_number)
        .bind(order.user_id)
        .bind(order.subtotal)
        .bind(order.shipping_cost)
        .bind(order.tax)
        .bind(order.total)
        .bind(order.total_weight_kg)
        .bind(order.shipping_type)
        .bind(order.delivery_date)
        .bind(order.delivery_time_slot.id())
        .bind(order.delivery_notes.as_deref())
        .bind(Json(&order.shipping_address))
        .bind(&order.payment_method)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "order number already exists"))?;

        for item in &order.items {
            sqlx::query(
                r"
                INSERT INTO storefront.order_item (
                    order_id, product_id, product_name, product_image, quantity,
                    unit_type, unit_price, total_price, weight_kg
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                ",
            )
            .bind(order_id)
            .bind(item.product_id)
            .bind(&item.product_name)
            .bind(item.product_image.as_deref())
            .bind(item.quantity)
            .bind(&item.unit_type)
            .bind(item.unit_price)
            .bind(item.total_price)
            .bind(item.weight_kg)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(OrderId::new(order_id))
    }

    /// Record the payment provider's checkout session on an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    pub async fn set_payment_intent(
        &self,
        order_id: OrderId,
        payment_intent_id: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE storefront.order
            SET payment_intent_id = $2, updated_at = now()
            WHERE id = $1
            ",
        )
        .bind(order_id)
        .bind(payment_intent_id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Delete an order; its lines go with it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, order_id: OrderId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM storefront.order WHERE id = $1")
            .bind(order_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// An order with its lines, only if it belongs to `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    /// Returns `RepositoryError::DataCorruption` for an unknown stored time slot.
    pub async fn get_for_user(
        &self,
        user_id: UserId,
        order_id: OrderId,
    ) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "{ORDER_SELECT} WHERE id = $1 AND user_id = $2"
        ))
        .bind(order_id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(self.attach_items(row.into_iter().collect()).await?.pop())
    }

    /// A user's orders with their lines, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
        limit: i64,
        cursor: Cursor,
    ) -> Result<Page<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "{ORDER_SELECT}
             WHERE user_id = $1
             ORDER BY created_at DESC, id DESC
             LIMIT $2 OFFSET $3"
        ))
        .bind(user_id)
        .bind(limit + 1)
        .bind(cursor.offset())
        .fetch_all(self.pool)
        .await?;

        let orders = self.attach_items(rows).await?;
        Ok(Page::from_overfetch(orders, cursor, limit))
    }

    /// Most recent orders, optionally restricted to one buyer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn recent(
        &self,
        user_id: Option<UserId>,
        limit: i64,
    ) -> Result<Vec<OrderSummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderSummaryRow>(&format!(
            "{SUMMARY_SELECT}
             WHERE $1::INTEGER IS NULL OR o.user_id = $1
             ORDER BY o.created_at DESC, o.id DESC
             LIMIT $2"
        ))
        .bind(user_id)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(OrderSummary::from).collect())
    }

    /// Most recent orders containing at least one of a producer's products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn recent_for_producer(
        &self,
        producer_id: UserId,
        limit: i64,
    ) -> Result<Vec<OrderSummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderSummaryRow>(&format!(
            "{SUMMARY_SELECT}
             WHERE EXISTS (
                 SELECT 1 FROM storefront.order_item i
                 JOIN storefront.product p ON p.id = i.product_id
                 WHERE i.order_id = o.id AND p.producer_id = $1
             )
             ORDER BY o.created_at DESC, o.id DESC
             LIMIT $2"
        ))
        .bind(producer_id)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(OrderSummary::from).collect())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn customer_stats(&self, user_id: UserId) -> Result<CustomerOrderStats, RepositoryError> {
        let stats = sqlx::query_as::<_, CustomerOrderStats>(
            r"
            SELECT
                COUNT(*) AS total_orders,
                COUNT(*) FILTER (WHERE status NOT IN ('DELIVERED', 'CANCELLED')) AS active_orders,
                COALESCE(SUM(total) FILTER (WHERE payment_status = 'PAID'), 0) AS total_spent
            FROM storefront.order
            WHERE user_id = $1
            ",
        )
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;

        Ok(stats)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn merchant_stats(&self) -> Result<MerchantOrderStats, RepositoryError> {
        let stats = sqlx::query_as::<_, MerchantOrderStats>(
            r"
            SELECT
                COUNT(*) AS total_orders,
                COUNT(*) FILTER (WHERE status = 'PENDING') AS pending_orders,
                (SELECT COUNT(DISTINCT producer_id) FROM storefront.product
                 WHERE status = 'ACTIVE' AND producer_id IS NOT NULL) AS active_suppliers,
                COALESCE(SUM(total) FILTER (
                    WHERE payment_status = 'PAID'
                      AND created_at >= date_trunc('month', now())
                ), 0) AS monthly_revenue
            FROM storefront.order
            ",
        )
        .fetch_one(self.pool)
        .await?;

        Ok(stats)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn producer_stats(&self, producer_id: UserId) -> Result<ProducerOrderStats, RepositoryError> {
        let stats = sqlx::query_as::<_, ProducerOrderStats>(
            r"
            WITH producer_lines AS (
                SELECT o.id AS order_id, o.status, o.payment_status, o.created_at,
                       i.total_price
                FROM storefront.order_item i
                JOIN storefront.order o ON o.id = i.order_id
                JOIN storefront.product p ON p.id = i.product_id
                WHERE p.producer_id = $1
            )
            SELECT
                COUNT(DISTINCT order_id) FILTER (WHERE status = 'PENDING') AS pending_orders,
                COUNT(DISTINCT order_id) FILTER (WHERE status = 'SHIPPED') AS in_transit,
                COALESCE(SUM(total_price) FILTER (
                    WHERE payment_status = 'PAID'
                      AND created_at >= date_trunc('month', now())
                ), 0) AS monthly_revenue
            FROM producer_lines
            ",
        )
        .bind(producer_id)
        .fetch_one(self.pool)
        .await?;

        Ok(stats)
    }

    async fn attach_items(&self, rows: Vec<OrderRow>) -> Result<Vec<Order>, RepositoryError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i32> = rows.iter().map(|row| row.id).collect();

        let item_rows = sqlx::query_as::<_, OrderItemRow>(
            r"
            SELECT id, order_id, product_id, product_name, product_image, quantity,
                   unit_type, unit_price, total_price, weight_kg
            FROM storefront.order_item
            WHERE order_id = ANY($1)
            ORDER BY order_id, id
            ",
        )
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        let mut items: HashMap<i32, Vec<OrderItem>> = HashMap::new();
        for row in item_rows {
            items.entry(row.order_id).or_default().push(row.into());
        }

        rows.into_iter()
            .map(|row| {
                let order_items = items.remove(&row.id).unwrap_or_default();
                row.into_order(order_items)
            })
            .collect()
    }
}
