//! Checkout order creation against an in-memory store.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal::{Decimal, dec};

use freshdart_core::{
    Email, Freshness, OrderId, ProductId, ProductImageId, ProductStatus, ShippingRate,
    ShippingRateTable, ShippingType, StockType, UserId, UserRole,
};
use freshdart_integration_tests::StubGateway;
use freshdart_storefront::db::RepositoryError;
use freshdart_storefront::models::{CurrentUser, NewOrder, Product, ProductImage, ShippingAddress};
use freshdart_storefront::services::checkout::{
    CheckoutError, CheckoutLine, CheckoutService, CheckoutStore, CreateSessionRequest,
};
use freshdart_storefront::services::paymongo::line_items_total;

#[derive(Default)]
struct MemoryStore {
    products: Vec<Product>,
    orders: Mutex<Vec<(OrderId, NewOrder)>>,
    deleted: Mutex<Vec<OrderId>>,
    insert_attempts: AtomicUsize,
    /// Number of leading inserts that fail with an order number conflict.
    conflicts: usize,
}

impl MemoryStore {
    fn stocked() -> Self {
        Self {
            products: vec![
                product(1, "Galunggong", dec!(160), dec!(12)),
                product(2, "Blue Crab", dec!(520), dec!(3)),
                Product {
                    status: ProductStatus::OutOfStock,
                    ..product(3, "Lapu-Lapu", dec!(680), dec!(0))
                },
            ],
            ..Self::default()
        }
    }

    fn order_count(&self) -> usize {
        self.orders.lock().unwrap().len()
    }
}

#[async_trait]
impl CheckoutStore for MemoryStore {
    async fn products_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        Ok(self
            .products
            .iter()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }

    async fn insert_order(&self, order: &NewOrder) -> Result<OrderId, RepositoryError> {
        let attempt = self.insert_attempts.fetch_add(1, Ordering::SeqCst);
        if attempt < self.conflicts {
            return Err(RepositoryError::Conflict(order.order_number.clone()));
        }
        let mut orders = self.orders.lock().unwrap();
        let id = OrderId::new(i32::try_from(orders.len()).unwrap() + 100);
        orders.push((id, order.clone()));
        Ok(id)
    }

    async fn set_payment_intent(&self, _: OrderId, _: &str) -> Result<(), RepositoryError> {
        Ok(())
    }

    async fn delete_order(&self, order_id: OrderId) -> Result<bool, RepositoryError> {
        let mut orders = self.orders.lock().unwrap();
        let before = orders.len();
        orders.retain(|(id, _)| *id != order_id);
        self.deleted.lock().unwrap().push(order_id);
        Ok(orders.len() != before)
    }
}

fn product(id: i32, name: &str, price: Decimal, stock: Decimal) -> Product {
    Product {
        id: ProductId::new(id),
        name: name.to_owned(),
        slug: name.to_lowercase(),
        description: None,
        short_description: None,
        price,
        compare_at_price: None,
        stock_type: StockType::Weight,
        stock_quantity: stock,
        stock_unit: "kg".to_owned(),
        min_order_qty: dec!(0.5),
        max_order_qty: None,
        weight_kg: dec!(1),
        best_before: None,
        shelf_life_days: Some(2),
        status: ProductStatus::Active,
        featured: false,
        tags: vec!["seafood".to_owned()],
        category: None,
        images: vec![ProductImage {
            id: ProductImageId::new(id),
            url: format!("https://cdn.freshdart.ph/p/{id}.jpg"),
            alt: None,
            is_primary: true,
            sort_order: 0,
        }],
        freshness: Freshness::Fresh,
        created_at: Utc::now(),
    }
}

fn buyer() -> CurrentUser {
    CurrentUser {
        id: UserId::new(3),
        name: "Rommel Garcia".to_owned(),
        email: Email::parse("rommel@carinderia.ph").unwrap(),
        role: UserRole::Merchant,
    }
}

fn order_request(lines: &[(i32, Decimal)], shipping_type: ShippingType) -> CreateSessionRequest {
    CreateSessionRequest {
        items: lines
            .iter()
            .map(|&(id, quantity)| CheckoutLine {
                product_id: ProductId::new(id),
                quantity,
            })
            .collect(),
        shipping_address: ShippingAddress {
            street: "8 Taft Ave".to_owned(),
            city: "Pasay".to_owned(),
            state: "Metro Manila".to_owned(),
            postal_code: "1300".to_owned(),
            country: "Philippines".to_owned(),
            phone: "+63 918 555 0199".to_owned(),
        },
        delivery_date: NaiveDate::from_ymd_opt(2026, 10, 24).unwrap(),
        delivery_time_slot: "afternoon".to_owned(),
        delivery_notes: Some("Call on arrival".to_owned()),
        shipping_type,
    }
}

fn checkout<'a>(
    store: &'a MemoryStore,
    gateway: &'a StubGateway,
    rates: ShippingRateTable,
) -> CheckoutService<'a, MemoryStore, StubGateway> {
    CheckoutService::new(store, gateway, Arc::new(rates), "https://freshdart.ph")
}

#[tokio::test]
async fn test_failed_payment_removes_order() {
    let store = MemoryStore::stocked();
    let gateway = StubGateway::failing();

    let err = checkout(&store, &gateway, ShippingRateTable::default())
        .create_session(&buyer(), &order_request(&[(1, dec!(2))], ShippingType::Standard))
        .await
        .unwrap_err();

    assert!(matches!(err, CheckoutError::PaymentFailed));
    assert_eq!(err.to_string(), "Failed to create payment session");
    assert_eq!(gateway.call_count(), 1);
    assert_eq!(store.order_count(), 0);
    assert_eq!(store.deleted.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_one_bad_line_rejects_whole_basket() {
    let store = MemoryStore::stocked();
    let gateway = StubGateway::succeeding();
    let service = checkout(&store, &gateway, ShippingRateTable::default());

    let err = service
        .create_session(
            &buyer(),
            &order_request(&[(1, dec!(2)), (2, dec!(3.5))], ShippingType::Standard),
        )
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Insufficient stock for Blue Crab. Available: 3");

    let err = service
        .create_session(
            &buyer(),
            &order_request(&[(1, dec!(1)), (3, dec!(1))], ShippingType::Standard),
        )
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Product is not available: Lapu-Lapu");
    assert!(err.is_client_error());

    assert_eq!(store.insert_attempts.load(Ordering::SeqCst), 0);
    assert_eq!(gateway.call_count(), 0);
}

#[tokio::test]
async fn test_order_number_collision_is_retried() {
    let store = MemoryStore {
        conflicts: 2,
        ..MemoryStore::stocked()
    };
    let gateway = StubGateway::succeeding();

    let created = checkout(&store, &gateway, ShippingRateTable::default())
        .create_session(&buyer(), &order_request(&[(2, dec!(1))], ShippingType::Standard))
        .await
        .unwrap();

    assert_eq!(store.insert_attempts.load(Ordering::SeqCst), 3);
    assert_eq!(store.order_count(), 1);
    assert!(created.checkout_url.ends_with(&format!("cs_test_{}", created.order_id)));
}

#[tokio::test]
async fn test_persistent_collision_fails_without_payment() {
    let store = MemoryStore {
        conflicts: usize::MAX,
        ..MemoryStore::stocked()
    };
    let gateway = StubGateway::succeeding();

    let err = checkout(&store, &gateway, ShippingRateTable::default())
        .create_session(&buyer(), &order_request(&[(2, dec!(1))], ShippingType::Standard))
        .await
        .unwrap_err();

    assert!(matches!(err, CheckoutError::Repository(RepositoryError::Conflict(_))));
    assert!(!err.is_client_error());
    assert_eq!(store.insert_attempts.load(Ordering::SeqCst), 3);
    assert_eq!(gateway.call_count(), 0);
}

#[tokio::test]
async fn test_order_priced_with_configured_rates() {
    let store = MemoryStore::stocked();
    let gateway = StubGateway::succeeding();
    let rates = ShippingRateTable::new(vec![ShippingRate {
        name: "Same-day Metro Manila".to_owned(),
        shipping_type: ShippingType::Express,
        min_weight_kg: Decimal::ZERO,
        max_weight_kg: Some(dec!(20)),
        base_price: dec!(120),
        price_per_kg: dec!(20),
        estimated_days: 1,
    }]);

    checkout(&store, &gateway, rates)
        .create_session(
            &buyer(),
            &order_request(&[(1, dec!(1.5)), (2, dec!(2))], ShippingType::Express),
        )
        .await
        .unwrap();

    let orders = store.orders.lock().unwrap();
    let (_, order) = &orders[0];
    // 240 + 1040, 3.5 kg: 120 + 70
    assert_eq!(order.subtotal, dec!(1280));
    assert_eq!(order.shipping_cost, dec!(190));
    assert_eq!(order.tax, Decimal::ZERO);
    assert_eq!(order.total, dec!(1470));
    assert_eq!(order.total_weight_kg, dec!(3.5));
    assert_eq!(order.shipping_type, ShippingType::Express);
    assert_eq!(order.delivery_notes.as_deref(), Some("Call on arrival"));
    assert_eq!(order.items[0].product_image.as_deref(), Some("https://cdn.freshdart.ph/p/1.jpg"));

    let requests = gateway.requests.lock().unwrap();
    let sent = &requests[0];
    assert_eq!(sent.amount, 147_000);
    let shipping = sent.line_items.last().unwrap();
    assert_eq!(shipping.name, "Same-day Metro Manila");
    assert_eq!((shipping.quantity, shipping.amount), (1, 19_000));
    assert_eq!(line_items_total(&sent.line_items), Some(147_000));
}
