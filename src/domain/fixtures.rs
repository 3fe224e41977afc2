//! Fixture data written by `seed` and described to the assistant.

use crate::domain::model::{Article, Product};
use serde_json::json;

pub const ARTICLE_INDEX: &str = "blog_articles";
pub const PRODUCT_COLLECTION: &str = "product_embeddings";
pub const VECTOR_SIZE: usize = 384;
pub const SESSION_PREFIX: &str = "session:";
pub const COUNTER_PREFIX: &str = "counter:";
pub const CATEGORIES_KEY: &str = "categories:all";
pub const RECENT_SEARCH_KEY: &str = "search:recent";

pub struct Session {
    pub key: &'static str,
    pub user_id: u32,
    pub username: &'static str,
    pub login_time: &'static str,
}

pub const SESSIONS: &[Session] = &[
    Session { key: "session:user1", user_id: 1, username: "tanaka", login_time: "2024-01-15 10:30:00" },
    Session { key: "session:user2", user_id: 2, username: "sato", login_time: "2024-01-15 11:15:00" },
    Session { key: "session:user3", user_id: 3, username: "suzuki", login_time: "2024-01-15 09:45:00" },
];

pub const COUNTERS: &[(&str, u64)] = &[
    ("page_views", 1250),
    ("user_registrations", 89),
    ("sales_today", 15),
    ("active_sessions", 3),
];

pub const CATEGORIES: &[&str] = &["エレクトロニクス", "キッチン家電", "ファッション", "スポーツ", "本・メディア"];

pub const RECENT_SEARCHES: &[&str] = &["ノートPC", "コーヒーメーカー", "ワイヤレスイヤホン", "ビジネスバッグ", "スニーカー"];

pub fn user_profiles() -> Vec<(&'static str, serde_json::Value)> {
    vec![
        (
            "profile:1",
            json!({
                "name": "田中太郎",
                "preferences": ["エレクトロニクス", "ガジェット"],
                "purchase_history": [{"product": "ノートPC", "date": "2024-01-10"}]
            }),
        ),
        (
            "profile:2",
            json!({
                "name": "佐藤花子",
                "preferences": ["キッチン家電", "ファッション"],
                "purchase_history": [{"product": "ワイヤレスイヤホン", "date": "2024-01-12"}]
            }),
        ),
    ]
}

pub fn articles() -> Vec<Article> {
    let article = |title: &str, content: &str, category: &str, author: &str, date: &str, tags: &[&str], views: u64| Article {
        title: title.to_string(),
        content: content.to_string(),
        category: category.to_string(),
        author: author.to_string(),
        published_date: date.to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        view_count: views,
    };

    vec![
        article(
            "Python機械学習入門",
            "Pythonを使った機械学習の基礎について説明します。scikit-learnやpandasを使って実際にデータ分析を行ってみましょう。",
            "技術",
            "山田太郎",
            "2024-01-15",
            &["Python", "機械学習", "データサイエンス"],
            1250,
        ),
        article(
            "Dockerコンテナ活用術",
            "Dockerを使ったアプリケーション開発とデプロイメントの実践的な方法を紹介します。Docker Composeも含めて解説。",
            "技術",
            "鈴木花子",
            "2024-01-12",
            &["Docker", "DevOps", "コンテナ"],
            980,
        ),
        article(
            "リモートワークの効率化",
            "在宅勤務で生産性を向上させるための具体的な方法とツールを紹介します。コミュニケーション改善のコツも。",
            "ビジネス",
            "田中一郎",
            "2024-01-10",
            &["リモートワーク", "生産性", "働き方改革"],
            1580,
        ),
        article(
            "Streamlit Web アプリ開発",
            "StreamlitでインタラクティブなWebアプリケーションを作成する方法を実例とともに解説します。",
            "技術",
            "佐藤美香",
            "2024-01-08",
            &["Streamlit", "Python", "Webアプリ"],
            750,
        ),
        article(
            "AI活用ビジネス事例",
            "企業でのAI導入成功事例と失敗事例を分析し、効果的なAI活用のポイントを解説します。",
            "ビジネス",
            "高橋健太",
            "2024-01-05",
            &["AI", "DX", "ビジネス戦略"],
            2100,
        ),
    ]
}

pub fn products() -> Vec<(u64, Product)> {
    let product = |name: &str, category: &str, description: &str, price: u64| Product {
        name: name.to_string(),
        category: category.to_string(),
        description: description.to_string(),
        price,
    };

    vec![
        (1, product("高性能ノートPC", "エレクトロニクス", "プログラミングやデザイン作業に最適な高性能ノートパソコン", 89800)),
        (2, product("ワイヤレスイヤホン", "エレクトロニクス", "ノイズキャンセリング機能付きの高音質ワイヤレスイヤホン", 12800)),
        (3, product("全自動コーヒーメーカー", "キッチン家電", "豆から挽ける全自動タイプのコーヒーメーカー", 15600)),
        (4, product("レザービジネスバッグ", "ファッション", "本革製の高級ビジネスバッグ、ノートPCも収納可能", 8900)),
        (5, product("ランニングシューズ", "スポーツ", "軽量で通気性の良いランニング専用シューズ", 9800)),
    ]
}

pub struct CustomerRow {
    pub name: &'static str,
    pub email: &'static str,
    pub city: &'static str,
}

pub const CUSTOMERS: &[CustomerRow] = &[
    CustomerRow { name: "田中太郎", email: "tanaka@example.com", city: "東京" },
    CustomerRow { name: "佐藤花子", email: "sato@example.com", city: "大阪" },
    CustomerRow { name: "鈴木一郎", email: "suzuki@example.com", city: "東京" },
    CustomerRow { name: "高橋美咲", email: "takahashi@example.com", city: "名古屋" },
    CustomerRow { name: "伊藤健太", email: "ito@example.com", city: "福岡" },
];

pub struct StockRow {
    pub product_id: u64,
    pub stock_quantity: i32,
}

pub const STOCK: &[StockRow] = &[
    StockRow { product_id: 1, stock_quantity: 15 },
    StockRow { product_id: 2, stock_quantity: 42 },
    StockRow { product_id: 3, stock_quantity: 8 },
    StockRow { product_id: 4, stock_quantity: 20 },
    StockRow { product_id: 5, stock_quantity: 33 },
];

pub struct OrderRow {
    pub customer_id: i32,
    pub product_id: u64,
    pub quantity: i32,
    pub order_date: &'static str,
}

pub const ORDERS: &[OrderRow] = &[
    OrderRow { customer_id: 1, product_id: 1, quantity: 1, order_date: "2024-01-10 14:20:00" },
    OrderRow { customer_id: 2, product_id: 2, quantity: 2, order_date: "2024-01-12 09:05:00" },
    OrderRow { customer_id: 3, product_id: 3, quantity: 1, order_date: "2024-01-12 18:40:00" },
    OrderRow { customer_id: 1, product_id: 2, quantity: 1, order_date: "2024-01-13 11:00:00" },
    OrderRow { customer_id: 4, product_id: 4, quantity: 1, order_date: "2024-01-14 16:30:00" },
    OrderRow { customer_id: 5, product_id: 5, quantity: 2, order_date: "2024-01-15 08:15:00" },
    OrderRow { customer_id: 3, product_id: 1, quantity: 1, order_date: "2024-01-15 13:45:00" },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orders_reference_existing_rows() {
        let product_ids: Vec<u64> = products().iter().map(|(id, _)| *id).collect();
        for order in ORDERS {
            assert!(product_ids.contains(&order.product_id));
            assert!((order.customer_id as usize) <= CUSTOMERS.len());
        }
        assert_eq!(STOCK.len(), product_ids.len());
    }

    #[test]
    fn test_fixture_counts() {
        assert_eq!(articles().len(), 5);
        assert_eq!(products().len(), 5);
        assert_eq!(SESSIONS.len(), 3);
        assert_eq!(user_profiles().len(), 2);
    }
}
