//! Pagination and field selection values

/// Row limit, clamped to `[0, max]` at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limit {
    value: u32,
}

impl Limit {
    pub fn new(requested: i64, max: u32) -> Self {
        let value = requested.clamp(0, i64::from(max)) as u32;
        Self { value }
    }

    pub fn value(&self) -> u32 {
        self.value
    }
}

/// Row offset, unbounded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Offset {
    value: u64,
}

impl Offset {
    pub fn new(value: u64) -> Self {
        Self { value }
    }

    pub fn value(&self) -> u64 {
        self.value
    }
}

/// Selected output column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
}

impl Field {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}
