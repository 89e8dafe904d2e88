use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use smartlock_types::domain::contact::{ContactMessage, MessageStatus, NewMessage};
use smartlock_types::domain::customer::Customer;
use smartlock_types::domain::lifecycle::Lifecycle;
use smartlock_types::domain::order::{NewOrder, Order, OrderItem, OrderStatus};
use smartlock_types::domain::product::{NewProduct, Product, ProductCategory};
use smartlock_types::domain::stock::{ReservedLine, StockReservation, StockShortage};
use smartlock_types::domain::visit::{NewVisit, SiteStats, StatsWindows};
use smartlock_types::ports::{
    CatalogRepository, MessageRepository, OrderRepository, RepoError, ReservationError,
    VisitRepository,
};
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{FromRow, SqlitePool};
use std::str::FromStr;
use std::time::Duration;

const MIGRATION: &str = include_str!("../migrations/0001_init.sql");

const PRODUCT_COLUMNS: &str =
    "id, name, description, price, image, category, stock, features_json, created_at";
const ORDER_COLUMNS: &str = "id, customer_name, customer_email, customer_phone, customer_address, customer_city, customer_postal_code, total_amount, items_json, status, payment_intent_id, created_at, updated_at";
const MESSAGE_COLUMNS: &str = "id, name, email, subject, message, status, created_at";

pub struct SqliteRepo {
    pool: SqlitePool,
}

fn db_err(e: impl std::fmt::Display) -> RepoError {
    RepoError::DbError(e.to_string())
}

/// Fixed-width UTC timestamps, so text comparison in SQL matches time order.
fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, RepoError> {
    Ok(DateTime::parse_from_rfc3339(s)
        .map_err(db_err)?
        .with_timezone(&Utc))
}

fn parse_decimal(s: &str) -> Result<Decimal, RepoError> {
    Decimal::from_str(s).map_err(db_err)
}

fn stock_from_db(stock: i64) -> Result<u32, RepoError> {
    u32::try_from(stock).map_err(db_err)
}

#[derive(FromRow)]
struct DbProduct {
    id: i64,
    name: String,
    description: String,
    price: String,
    image: String,
    category: String,
    stock: i64,
    features_json: String,
    created_at: String,
}

impl DbProduct {
    fn into_product(self) -> Result<Product, RepoError> {
        Ok(Product {
            id: self.id,
            name: self.name,
            description: self.description,
            price: parse_decimal(&self.price)?,
            image: self.image,
            category: ProductCategory::from_str(&self.category).map_err(db_err)?,
            stock: stock_from_db(self.stock)?,
            features: serde_json::from_str(&self.features_json).map_err(db_err)?,
            created_at: parse_timestamp(&self.created_at)?,
        })
    }
}

#[derive(FromRow)]
struct DbOrder {
    id: i64,
    customer_name: String,
    customer_email: String,
    customer_phone: String,
    customer_address: String,
    customer_city: String,
    customer_postal_code: String,
    total_amount: String,
    items_json: String,
    status: String,
    payment_intent_id: Option<String>,
    created_at: String,
    updated_at: String,
}

impl DbOrder {
    fn into_order(self) -> Result<Order, RepoError> {
        let status = OrderStatus::from_str(&self.status).map_err(db_err)?;
        let order_items: Vec<OrderItem> =
            serde_json::from_str(&self.items_json).map_err(db_err)?;
        Ok(Order {
            id: self.id,
            customer: Customer {
                name: self.customer_name,
                email: self.customer_email,
                phone: self.customer_phone,
                address: self.customer_address,
                city: self.customer_city,
                postal_code: self.customer_postal_code,
            },
            total_amount: parse_decimal(&self.total_amount)?,
            order_items,
            status,
            payment_intent_id: self.payment_intent_id,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}

#[derive(FromRow)]
struct DbMessage {
    id: i64,
    name: String,
    email: String,
    subject: String,
    message: String,
    status: String,
    created_at: String,
}

impl DbMessage {
    fn into_message(self) -> Result<ContactMessage, RepoError> {
        Ok(ContactMessage {
            id: self.id,
            name: self.name,
            email: self.email,
            subject: self.subject,
            message: self.message,
            status: MessageStatus::from_str(&self.status).map_err(db_err)?,
            created_at: parse_timestamp(&self.created_at)?,
        })
    }
}

/// `?, ?, ?` for `n` bind parameters.
fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

impl SqliteRepo {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        // Ensure on-disk SQLite target directory exists (no-op for in-memory).
        if let Some(path) = database_url.strip_prefix("sqlite://") {
            if path != ":memory:" {
                let p = std::path::Path::new(path);
                if let Some(parent) = p.parent() {
                    if !parent.as_os_str().is_empty() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePool::connect_with(options).await?;

        for statement in MIGRATION.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            sqlx::query(statement).execute(&pool).await?;
        }

        tracing::debug!(url = database_url, "sqlite store ready");
        Ok(Self { pool })
    }
}

#[async_trait]
impl CatalogRepository for SqliteRepo {
    async fn create_product(&self, product: NewProduct) -> Result<Product, RepoError> {
        let features_json = serde_json::to_string(&product.features).map_err(db_err)?;
        let created_at = Utc::now();
        let res = sqlx::query(
            "INSERT INTO products (name, description, price, image, category, stock, features_json, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price.to_string())
        .bind(&product.image)
        .bind(product.category.as_str())
        .bind(i64::from(product.stock))
        .bind(features_json)
        .bind(timestamp(created_at))
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(product.into_product(res.last_insert_rowid(), created_at))
    }

    async fn get_product(&self, id: i64) -> Result<Option<Product>, RepoError> {
        let row: Option<DbProduct> =
            sqlx::query_as(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_err)?;
        row.map(DbProduct::into_product).transpose()
    }

    async fn list_products(&self) -> Result<Vec<Product>, RepoError> {
        let rows: Vec<DbProduct> =
            sqlx::query_as(&format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY id"))
                .fetch_all(&self.pool)
                .await
                .map_err(db_err)?;
        rows.into_iter().map(DbProduct::into_product).collect()
    }

    async fn update_product(
        &self,
        id: i64,
        product: NewProduct,
    ) -> Result<Option<Product>, RepoError> {
        let features_json = serde_json::to_string(&product.features).map_err(db_err)?;
        let updated = sqlx::query(
            "UPDATE products
             SET name = ?, description = ?, price = ?, image = ?, category = ?, stock = ?, features_json = ?
             WHERE id = ?",
        )
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price.to_string())
        .bind(&product.image)
        .bind(product.category.as_str())
        .bind(i64::from(product.stock))
        .bind(features_json)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        if updated.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_product(id).await
    }

    async fn delete_product(&self, id: i64) -> Result<bool, RepoError> {
        let res = sqlx::query("DELETE FROM products WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(res.rows_affected() > 0)
    }

    async fn reserve(
        &self,
        items: &[StockReservation],
    ) -> Result<Vec<ReservedLine>, ReservationError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let mut lines = Vec::with_capacity(items.len());
        let mut shortages = Vec::new();

        for item in items {
            let qty = i64::from(item.quantity);
            let row: Option<(String, String)> = sqlx::query_as(
                "UPDATE products SET stock = stock - ? WHERE id = ? AND stock >= ? RETURNING name, price",
            )
            .bind(qty)
            .bind(item.product_id)
            .bind(qty)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_err)?;

            match row {
                Some((name, price)) => lines.push(ReservedLine {
                    product_id: item.product_id,
                    product_name: name,
                    quantity: item.quantity,
                    unit_price: parse_decimal(&price)?,
                }),
                None => {
                    let available: Option<i64> =
                        sqlx::query_scalar("SELECT stock FROM products WHERE id = ?")
                            .bind(item.product_id)
                            .fetch_optional(&mut *tx)
                            .await
                            .map_err(db_err)?;
                    shortages.push(StockShortage {
                        product_id: item.product_id,
                        requested: item.quantity,
                        available: available.map(stock_from_db).transpose()?,
                    });
                }
            }
        }

        if !shortages.is_empty() {
            tx.rollback().await.map_err(db_err)?;
            return Err(ReservationError::Insufficient(shortages));
        }
        tx.commit().await.map_err(db_err)?;
        Ok(lines)
    }

    async fn release(&self, items: &[StockReservation]) -> Result<(), RepoError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        for item in items {
            sqlx::query("UPDATE products SET stock = stock + ? WHERE id = ?")
                .bind(i64::from(item.quantity))
                .bind(item.product_id)
                .execute(&mut *tx)
                .await
                .map_err(db_err)?;
        }
        tx.commit().await.map_err(db_err)
    }
}

#[async_trait]
impl OrderRepository for SqliteRepo {
    async fn create_order(&self, order: NewOrder) -> Result<Order, RepoError> {
        let items_json = serde_json::to_string(&order.order_items).map_err(db_err)?;
        let now = Utc::now();
        let res = sqlx::query(
            "INSERT INTO orders (customer_name, customer_email, customer_phone, customer_address, customer_city, customer_postal_code, total_amount, items_json, status, payment_intent_id, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&order.customer.name)
        .bind(&order.customer.email)
        .bind(&order.customer.phone)
        .bind(&order.customer.address)
        .bind(&order.customer.city)
        .bind(&order.customer.postal_code)
        .bind(order.total_amount.to_string())
        .bind(items_json)
        .bind(OrderStatus::Pending.as_str())
        .bind(order.payment_intent_id.as_deref())
        .bind(timestamp(now))
        .bind(timestamp(now))
        .execute(&self.pool)
        .await;

        match res {
            Ok(done) => Ok(order.into_order(done.last_insert_rowid(), now)),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(RepoError::DuplicatePaymentReference(
                    order.payment_intent_id.unwrap_or_default(),
                ))
            }
            Err(e) => Err(db_err(e)),
        }
    }

    async fn get_order(&self, id: i64) -> Result<Option<Order>, RepoError> {
        let row: Option<DbOrder> =
            sqlx::query_as(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_err)?;
        row.map(DbOrder::into_order).transpose()
    }

    async fn find_by_payment_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Order>, RepoError> {
        let row: Option<DbOrder> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE payment_intent_id = ?"
        ))
        .bind(reference)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        row.map(DbOrder::into_order).transpose()
    }

    async fn list_orders(&self) -> Result<Vec<Order>, RepoError> {
        let rows: Vec<DbOrder> =
            sqlx::query_as(&format!("SELECT {ORDER_COLUMNS} FROM orders ORDER BY id DESC"))
                .fetch_all(&self.pool)
                .await
                .map_err(db_err)?;
        rows.into_iter().map(DbOrder::into_order).collect()
    }

    async fn update_order_status(
        &self,
        id: i64,
        status: OrderStatus,
    ) -> Result<Option<Order>, RepoError> {
        let allowed = OrderStatus::predecessors_of(status);
        let sql = format!(
            "UPDATE orders
             SET updated_at = CASE WHEN status = ? THEN updated_at ELSE ? END, status = ?
             WHERE id = ? AND status IN ({})",
            placeholders(allowed.len())
        );
        let mut query = sqlx::query(&sql)
            .bind(status.as_str())
            .bind(timestamp(Utc::now()))
            .bind(status.as_str())
            .bind(id);
        for from in &allowed {
            query = query.bind(from.as_str());
        }
        let updated = query.execute(&self.pool).await.map_err(db_err)?;

        let current = self.get_order(id).await?;
        match current {
            Some(order) if updated.rows_affected() == 0 => Err(RepoError::InvalidTransition {
                from: order.status.to_string(),
                to: status.to_string(),
            }),
            other => Ok(other),
        }
    }
}

#[async_trait]
impl MessageRepository for SqliteRepo {
    async fn create_message(&self, message: NewMessage) -> Result<ContactMessage, RepoError> {
        let created_at = Utc::now();
        let res = sqlx::query(
            "INSERT INTO contact_messages (name, email, subject, message, status, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&message.name)
        .bind(&message.email)
        .bind(&message.subject)
        .bind(&message.message)
        .bind(MessageStatus::New.as_str())
        .bind(timestamp(created_at))
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(message.into_message(res.last_insert_rowid(), created_at))
    }

    async fn get_message(&self, id: i64) -> Result<Option<ContactMessage>, RepoError> {
        let row: Option<DbMessage> = sqlx::query_as(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM contact_messages WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        row.map(DbMessage::into_message).transpose()
    }

    async fn list_messages(&self) -> Result<Vec<ContactMessage>, RepoError> {
        let rows: Vec<DbMessage> = sqlx::query_as(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM contact_messages ORDER BY id DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        rows.into_iter().map(DbMessage::into_message).collect()
    }

    async fn update_message_status(
        &self,
        id: i64,
        status: MessageStatus,
    ) -> Result<Option<ContactMessage>, RepoError> {
        let allowed = MessageStatus::predecessors_of(status);
        let sql = format!(
            "UPDATE contact_messages SET status = ? WHERE id = ? AND status IN ({})",
            placeholders(allowed.len())
        );
        let mut query = sqlx::query(&sql).bind(status.as_str()).bind(id);
        for from in &allowed {
            query = query.bind(from.as_str());
        }
        let updated = query.execute(&self.pool).await.map_err(db_err)?;

        let current = self.get_message(id).await?;
        match current {
            Some(message) if updated.rows_affected() == 0 => Err(RepoError::InvalidTransition {
                from: message.status.to_string(),
                to: status.to_string(),
            }),
            other => Ok(other),
        }
    }
}

#[async_trait]
impl VisitRepository for SqliteRepo {
    async fn log_visit(&self, visit: NewVisit) -> Result<(), RepoError> {
        sqlx::query(
            "INSERT INTO site_visits (visitor_ip, user_agent, page_path, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(visit.visitor_ip)
        .bind(visit.user_agent)
        .bind(visit.page_path)
        .bind(timestamp(Utc::now()))
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn site_stats(&self, now: DateTime<Utc>) -> Result<SiteStats, RepoError> {
        let w = StatsWindows::at(now);
        let (total, unique, today, week, month): (i64, i64, i64, i64, i64) = sqlx::query_as(
            "SELECT
                COUNT(*),
                COUNT(DISTINCT visitor_ip),
                COUNT(CASE WHEN created_at >= ? THEN 1 END),
                COUNT(CASE WHEN created_at >= ? THEN 1 END),
                COUNT(CASE WHEN created_at >= ? THEN 1 END)
             FROM site_visits",
        )
        .bind(timestamp(w.today))
        .bind(timestamp(w.week))
        .bind(timestamp(w.month))
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        let count = |n: i64| u64::try_from(n).unwrap_or_default();
        Ok(SiteStats {
            total_visits: count(total),
            unique_visitors: count(unique),
            today_visits: count(today),
            week_visits: count(week),
            month_visits: count(month),
        })
    }
}
