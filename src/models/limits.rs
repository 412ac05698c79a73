/// A share limit as understood by the torrent client.
///
/// The client encodes these as plain numbers: `-1` for no limit and `-2` for
/// "use the global default". Those sentinels are only produced and consumed at
/// the config and client boundaries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Limit<T> {
    Unlimited,
    Global,
    Value(T),
}

pub const NO_LIMIT: i64 = -1;
pub const GLOBAL_LIMIT: i64 = -2;

impl Limit<f64> {
    pub fn from_raw(raw: f64) -> Self {
        if raw == GLOBAL_LIMIT as f64 {
            Limit::Global
        } else if raw < 0.0 {
            Limit::Unlimited
        } else {
            Limit::Value(raw)
        }
    }

    pub fn to_raw(self) -> f64 {
        match self {
            Limit::Unlimited => NO_LIMIT as f64,
            Limit::Global => GLOBAL_LIMIT as f64,
            Limit::Value(v) => v,
        }
    }
}

impl Limit<i64> {
    pub fn from_raw(raw: i64) -> Self {
        match raw {
            GLOBAL_LIMIT => Limit::Global,
            r if r < 0 => Limit::Unlimited,
            r => Limit::Value(r),
        }
    }

    pub fn to_raw(self) -> i64 {
        match self {
            Limit::Unlimited => NO_LIMIT,
            Limit::Global => GLOBAL_LIMIT,
            Limit::Value(v) => v,
        }
    }
}

/// Upload speed cap in KiB/s
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpeedLimit {
    Unlimited,
    Kib(i64),
}

impl SpeedLimit {
    /// Non-positive values mean "no cap"
    pub fn from_kib(kib: i64) -> Self {
        if kib <= 0 {
            SpeedLimit::Unlimited
        } else {
            SpeedLimit::Kib(kib)
        }
    }

    /// Normalize a live cap in bytes/s; anything that rounds to zero is uncapped
    pub fn from_bytes(bytes: i64) -> Self {
        if bytes <= 0 {
            return SpeedLimit::Unlimited;
        }
        Self::from_kib((bytes as f64 / 1024.0).round() as i64)
    }

    /// Value for the client's set-upload-limit call, -1 meaning unlimited
    pub fn to_bytes(self) -> i64 {
        match self {
            SpeedLimit::Unlimited => NO_LIMIT,
            SpeedLimit::Kib(kib) => kib * 1024,
        }
    }
}

impl std::fmt::Display for SpeedLimit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpeedLimit::Unlimited => write!(f, "unlimited"),
            SpeedLimit::Kib(kib) => write!(f, "{} KiB/s", kib),
        }
    }
}

/// Share limits applied to a single torrent in one client call
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShareLimits {
    pub ratio: Limit<f64>,
    /// Minutes
    pub seeding_time: Limit<i64>,
    /// Minutes
    pub inactive_seeding_time: Limit<i64>,
}

impl ShareLimits {
    /// Everything lifted, used while a hold is active
    pub fn unrestricted() -> Self {
        Self {
            ratio: Limit::Unlimited,
            seeding_time: Limit::Unlimited,
            inactive_seeding_time: Limit::Unlimited,
        }
    }
}

/// Client-wide defaults that `Limit::Global` resolves to
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GlobalShareLimits {
    pub max_ratio_enabled: bool,
    pub max_ratio: f64,
    pub max_seeding_time_enabled: bool,
    /// Minutes
    pub max_seeding_time: i64,
}
