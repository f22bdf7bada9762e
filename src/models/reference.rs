use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Farm {
    pub id: i64,
    pub name: String,
    pub location: Option<String>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Flock {
    pub id: i64,
    pub farm_id: i64,
    pub name: String,
    pub breed: Option<String>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Shed {
    pub id: i64,
    pub flock_id: i64,
    pub name: String,
    pub capacity: Option<i32>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Buyer {
    pub id: i64,
    pub name: String,
    pub contact: Option<String>,
    pub address: Option<String>,
}

// Display-only projections joined onto ledger rows

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FarmRef {
    pub id: i64,
    pub name: String,
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlockRef {
    pub id: i64,
    pub name: String,
    pub breed: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShedRef {
    pub id: i64,
    pub name: String,
    pub capacity: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuyerRef {
    pub id: i64,
    pub name: String,
    pub contact: Option<String>,
}
