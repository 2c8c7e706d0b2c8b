//! Embedded SQL migrations, in application order

pub struct Migration {
    pub id: &'static str,
    pub sql: &'static str,
}

pub fn get_migrations() -> Vec<Migration> {
    vec![
        Migration {
            id: "001_pages",
            sql: include_str!("../../migrations/001_pages.sql"),
        },
        Migration {
            id: "002_history",
            sql: include_str!("../../migrations/002_history.sql"),
        },
    ]
}
