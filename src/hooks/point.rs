//! Extension point enumeration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::hooks::HookError;

/// The nine positions in the pipeline where hooks run, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HookPoint {
    BeforeAuth,
    AfterAuth,
    BeforeRequestTransform,
    AfterRequestTransform,
    BeforeForward,
    AfterForward,
    BeforeResponseTransform,
    AfterResponseTransform,
    OnError,
}

impl HookPoint {
    /// All points, in pipeline order.
    pub const ALL: [HookPoint; 9] = [
        HookPoint::BeforeAuth,
        HookPoint::AfterAuth,
        HookPoint::BeforeRequestTransform,
        HookPoint::AfterRequestTransform,
        HookPoint::BeforeForward,
        HookPoint::AfterForward,
        HookPoint::BeforeResponseTransform,
        HookPoint::AfterResponseTransform,
        HookPoint::OnError,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HookPoint::BeforeAuth => "BeforeAuth",
            HookPoint::AfterAuth => "AfterAuth",
            HookPoint::BeforeRequestTransform => "BeforeRequestTransform",
            HookPoint::AfterRequestTransform => "AfterRequestTransform",
            HookPoint::BeforeForward => "BeforeForward",
            HookPoint::AfterForward => "AfterForward",
            HookPoint::BeforeResponseTransform => "BeforeResponseTransform",
            HookPoint::AfterResponseTransform => "AfterResponseTransform",
            HookPoint::OnError => "OnError",
        }
    }
}

impl fmt::Display for HookPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HookPoint {
    type Err = HookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HookPoint::ALL
            .into_iter()
            .find(|point| point.as_str() == s)
            .ok_or_else(|| HookError::UnknownPoint(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roundtrips_every_point() {
        for point in HookPoint::ALL {
            assert_eq!(point.as_str().parse::<HookPoint>().unwrap(), point);
        }
        assert!(matches!(
            "beforeauth".parse::<HookPoint>(),
            Err(HookError::UnknownPoint(_))
        ));
    }

    #[test]
    fn test_serde_uses_names() {
        let json = serde_json::to_string(&HookPoint::AfterForward).unwrap();
        assert_eq!(json, "\"AfterForward\"");
        let point: HookPoint = serde_json::from_str("\"OnError\"").unwrap();
        assert_eq!(point, HookPoint::OnError);
    }
}
