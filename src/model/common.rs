use serde::{Deserialize, Serialize};

pub type Id = i32;

/// Status every new delivery request starts in.
pub const PENDING_STATUS: &str = "pending";

/// Role assigned to users registered without an explicit one.
pub const DEFAULT_USER_ROLE: &str = "basic_user";

/// Fixed role tag carried by couriers.
pub const COURIER_ROLE: &str = "courier";

/// Geographic coordinate of a map point. Travels on the wire as `[x, y]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

impl From<Point> for (f64, f64) {
    fn from(point: Point) -> Self {
        (point.x, point.y)
    }
}

/// Input checks that run before a command reaches the mutation pipeline.
pub trait Validate {
    fn validate(&self) -> Result<(), String>;
}

/// Treats an empty string the same as an absent value.
pub fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
