/// Specifies a timestamp as seconds since epoch.
pub type Timestamp = f64;

/// Specifies a distance in kilometers.
pub type Distance = f64;

/// Specifies a duration in seconds.
pub type Duration = f64;

/// Specifies a cost value.
pub type Cost = f64;
