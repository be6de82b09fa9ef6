// 1. Traits
pub use crate::frame::{ToCsv, ToDataFrame};

// 2. Data Model
pub use crate::series::{Observation, ResultEntry, ResultSeries, Series, TimePoint};

// 3. Configuration
pub use crate::calendar::{BusinessCalendar, Weekmask};
pub use crate::window::{Aggregation, ClosedWindow, RollingConfig, RollingStrategy, WindowOffset};

// 4. Transforms
pub use crate::bucket::{
    BucketClosed, BucketMean, IntervalBucket, bucket_means, resample_business_last,
};
pub use crate::explode::{ExpansionStrategy, Span, SubInterval, explode_spans};
pub use crate::parse::Table;
pub use crate::rolling::{augmented_index, compute_forward_rolling_sum, forward_rolling};

// 5. Errors
pub use crate::error::{
    CalendarError, DataError, IoError, ReshapeError, ReshapeResult, WindowError,
};
