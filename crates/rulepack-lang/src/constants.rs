pub const IN_ARRAY: &str = "in_array";
pub const ARRAY_SUM: &str = "array_sum";

pub const TRUE: &str = "true";
pub const FALSE: &str = "false";

pub const DEFAULT_CALL_PREFIX: &str = "c_";
pub const DEFAULT_MAX_DEPTH: u32 = 1024;
