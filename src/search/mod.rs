//! Property search core / 房源搜索核心
//!
//! Pipeline / 流程：
//! - loader: read the four CSV tables into raw rows / 读取四张表
//! - joiner: merge rows by foreign key into denormalized properties / 按外键合并
//! - store: populate-once, read-many snapshot / 一次加载、多次读取的快照
//! - filter: evaluate sparse criteria and bound the result page / 条件过滤与结果截断

pub mod filter;
pub mod joiner;
pub mod loader;
pub mod store;

pub use filter::{filter_properties, limit, FilterCriteria, NormalizedCriteria};
pub use joiner::{join, join_rows, JoinOutcome, JoinReport, RawTables};
pub use loader::{load_table, RawRow, TableKind};
pub use store::{PropertySnapshot, PropertyStore};
