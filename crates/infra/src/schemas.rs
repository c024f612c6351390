//! Store layouts for the records this service keeps.

use crate::crud::{Column, TableSchema};

/// MongoDB collection holding heroes.
pub const HEROES_COLLECTION: &str = "herois";

/// Relational users table (credentials checked on every request).
pub const USERS: TableSchema = TableSchema {
    name: "users",
    columns: &[
        Column {
            name: "username",
            definition: "TEXT NOT NULL UNIQUE",
        },
        Column {
            name: "password",
            definition: "TEXT NOT NULL",
        },
    ],
};

/// Relational layout for heroes, for deployments (and tests) that keep
/// heroes in Postgres instead of MongoDB.
pub const HEROES: TableSchema = TableSchema {
    name: "herois",
    columns: &[
        Column {
            name: "nome",
            definition: "VARCHAR(100) NOT NULL",
        },
        Column {
            name: "poder",
            definition: "VARCHAR(30) NOT NULL",
        },
    ],
};
