//! JSON test data with synthetic placeholder values.
//!
//! Fixtures live under a `TestData` resource folder and are addressed by
//! dotted names (`TestData.Users.json`). Records inside a fixture are picked
//! by their `TestDataId`:
//!
//! ```ignore
//! let reader = JsonTestDataReader::new(DirectoryStore::new("fixtures"));
//! let admin: User = reader.read("Users", "admin")?;
//! ```

mod placeholders;
mod random;
mod reader;

pub use placeholders::{
    to_strftime, Clock, DateTimeReplacer, FixedClock, GuidReplacer, NumericRangeReplacer,
    PlaceholderEngine, PlaceholderReplacer, ReplaceContext, StringLengthReplacer, SystemClock,
    TokenInfo,
};
pub use random::{random_decimal, random_string, StringKind};
pub use reader::{
    DirectoryStore, EmbeddedStore, FilesTestDataReader, JsonTestDataReader, ResourceStore,
    TestDataRecord, TEST_DATA_FOLDER, TEST_DATA_ID,
};
