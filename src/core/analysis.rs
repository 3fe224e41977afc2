//! Sales, customer and cache reports over the seeded data.

use crate::adapters::{PostgresBackend, RedisBackend};
use crate::core::status::StatusReport;
use crate::domain::model::{RedisStats, ServiceKind};
use crate::utils::error::Result;
use crate::utils::table::Table;
use serde::Serialize;
use std::fmt;

const PRODUCT_SALES_SQL: &str = "\
SELECT product_name,
       SUM(price * quantity) AS total_sales,
       COUNT(*) AS order_count,
       ROUND(AVG(price * quantity)) AS avg_order_value
FROM orders
GROUP BY product_name
ORDER BY total_sales DESC";

const CITY_STATS_SQL: &str = "\
SELECT c.city,
       COUNT(DISTINCT c.id) AS customer_count,
       COUNT(o.id) AS total_orders,
       COALESCE(SUM(o.price * o.quantity), 0) AS total_spent,
       ROUND(COALESCE(AVG(o.price * o.quantity), 0)) AS avg_order_value
FROM customers c
LEFT JOIN orders o ON c.id = o.customer_id
GROUP BY c.city
ORDER BY total_spent DESC";

const TOP_CUSTOMERS_SQL: &str = "\
SELECT c.name, c.city, c.email,
       COUNT(o.id) AS order_count,
       SUM(o.price * o.quantity) AS total_spent
FROM customers c
JOIN orders o ON c.id = o.customer_id
GROUP BY c.id, c.name, c.city, c.email
ORDER BY total_spent DESC
LIMIT 10";

const DAILY_SALES_SQL: &str = "\
SELECT DATE(order_date) AS date,
       COUNT(*) AS order_count,
       SUM(price * quantity) AS daily_sales
FROM orders
WHERE order_date IS NOT NULL
GROUP BY DATE(order_date)
ORDER BY date";

const CATEGORY_SQL: &str = "\
SELECT p.category,
       COUNT(DISTINCT p.id) AS product_count,
       COALESCE(SUM(o.price * o.quantity), 0) AS total_sales,
       COUNT(o.id) AS order_count
FROM products p
LEFT JOIN orders o ON p.name = o.product_name
GROUP BY p.category
ORDER BY total_sales DESC";

/// A report section that may be missing without failing the whole report.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "lowercase")]
pub enum Section<T> {
    Available(T),
    Unavailable(String),
}

impl<T> Section<T> {
    fn from_result(name: &str, result: Result<T>) -> Self {
        match result {
            Ok(value) => Section::Available(value),
            Err(e) => {
                tracing::warn!("{} analysis unavailable: {}", name, e);
                Section::Unavailable(e.to_string())
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SalesOverview {
    pub total_sales: i64,
    pub average_order_value: i64,
    pub order_count: i64,
    pub by_product: Table,
}

#[derive(Debug, Clone, Serialize)]
pub struct CustomerAnalysis {
    pub by_city: Table,
    pub top_customers: Table,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub sales: SalesOverview,
    pub customers: CustomerAnalysis,
    pub redis: RedisStats,
    pub daily_sales: Section<Table>,
    pub categories: Section<Table>,
}

pub async fn run_analysis(
    status: &StatusReport,
    postgres: &PostgresBackend,
    redis: &RedisBackend,
) -> Result<AnalysisReport> {
    status.require(&[ServiceKind::Postgres, ServiceKind::Redis])?;

    let sales = SalesOverview {
        total_sales: postgres
            .fetch_count("SELECT SUM(price * quantity)::BIGINT FROM orders")
            .await?,
        average_order_value: postgres
            .fetch_count("SELECT ROUND(AVG(price * quantity))::BIGINT FROM orders")
            .await?,
        order_count: postgres.fetch_count("SELECT COUNT(*) FROM orders").await?,
        by_product: postgres.fetch_table(PRODUCT_SALES_SQL).await?,
    };

    let customers = CustomerAnalysis {
        by_city: postgres.fetch_table(CITY_STATS_SQL).await?,
        top_customers: postgres.fetch_table(TOP_CUSTOMERS_SQL).await?,
    };

    let redis = redis.stats().await?;

    let daily_sales = Section::from_result("Daily sales", postgres.fetch_table(DAILY_SALES_SQL).await);
    let categories = Section::from_result("Category", postgres.fetch_table(CATEGORY_SQL).await);

    Ok(AnalysisReport {
        sales,
        customers,
        redis,
        daily_sales,
        categories,
    })
}

/// Formats an amount as yen with thousands separators, e.g. `¥1,234,567`.
pub fn format_yen(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if amount < 0 {
        format!("-¥{}", grouped)
    } else {
        format!("¥{}", grouped)
    }
}

impl fmt::Display for AnalysisReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "💰 Sales")?;
        writeln!(f, "  Total sales:         {}", format_yen(self.sales.total_sales))?;
        writeln!(f, "  Average order value: {}", format_yen(self.sales.average_order_value))?;
        writeln!(f, "  Orders:              {}", self.sales.order_count)?;
        writeln!(f, "\n📊 Sales by product\n{}", self.sales.by_product.render())?;

        writeln!(f, "\n👥 Customers by city\n{}", self.customers.by_city.render())?;
        writeln!(f, "\n🏆 Top customers\n{}", self.customers.top_customers.render())?;

        let r = &self.redis;
        writeln!(f, "\n🔴 Redis")?;
        writeln!(f, "  Active sessions:   {}", r.active_sessions)?;
        writeln!(f, "  Page views:        {}", r.page_views)?;
        writeln!(f, "  Recent searches:   {}", r.recent_searches)?;
        writeln!(f, "  Used memory:       {}", r.used_memory)?;
        writeln!(f, "  Connected clients: {}", r.connected_clients)?;
        writeln!(f, "  Total commands:    {}", r.total_commands)?;
        write!(f, "  Uptime:            {} days", r.uptime_days)?;

        for (title, section) in [
            ("📈 Daily sales", &self.daily_sales),
            ("🗂️ Categories", &self.categories),
        ] {
            match section {
                Section::Available(table) => write!(f, "\n\n{}\n{}", title, table.render())?,
                Section::Unavailable(reason) => {
                    write!(f, "\n\n{}: unavailable ({})", title, reason)?
                }
            }
        }
        Ok(())
    }
}
