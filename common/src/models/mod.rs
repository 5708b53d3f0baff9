//! Data models shared by the controllers.

pub mod bookmark;
pub mod column;
pub mod database;
pub mod index;
pub mod query;
pub mod search;
pub mod storage;

pub use bookmark::{Bookmark, NewBookmark};
pub use column::{ColumnFull, ColumnValuesRequest};
pub use database::{DatabaseListItem, ListDatabasesQuery};
pub use index::{Index, IndexChoice, IndexColumn, IndexSaveRequest};
pub use query::{ColumnInfo, ImportRequest, QueryResult};
pub use search::{
    ColumnRangeRequest, DataRowRequest, SearchCriterion, SortOrder, TableQuery, TableSearchRequest,
};
pub use storage::CheckRelationsRequest;
