//! Service duration estimates driven by the client's hair profile.
//!
//! A haircut on long, thick, curly hair takes longer than the catalogue's
//! base duration. For hair-dependent services the base is scaled by one
//! multiplier per profile attribute, then rounded up to the slot grid so the
//! estimate can be booked directly.

use serde::{Deserialize, Serialize};

use crate::error::{HoursError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HairLength {
    #[default]
    Short,
    Medium,
    Long,
    VeryLong,
}

impl HairLength {
    /// Multiplier in percent.
    fn factor(self) -> u32 {
        match self {
            HairLength::Short => 100,
            HairLength::Medium => 120,
            HairLength::Long => 140,
            HairLength::VeryLong => 160,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HairThickness {
    Fine,
    #[default]
    Medium,
    Thick,
}

impl HairThickness {
    fn factor(self) -> u32 {
        match self {
            HairThickness::Fine => 90,
            HairThickness::Medium => 100,
            HairThickness::Thick => 120,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HairTexture {
    #[default]
    Straight,
    Wavy,
    Curly,
    Coily,
}

impl HairTexture {
    fn factor(self) -> u32 {
        match self {
            HairTexture::Straight => 100,
            HairTexture::Wavy => 110,
            HairTexture::Curly => 120,
            HairTexture::Coily => 130,
        }
    }
}

/// Parse the snake_case names used on the wire (`"very_long"`, `"coily"`...).
macro_rules! impl_from_str {
    ($ty:ty, $what:literal, { $($name:literal => $variant:expr),+ $(,)? }) => {
        impl std::str::FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                match s.trim().to_lowercase().replace('-', "_").as_str() {
                    $($name => Ok($variant),)+
                    other => Err(format!("unknown {} '{}'", $what, other)),
                }
            }
        }
    };
}

impl_from_str!(HairLength, "hair length", {
    "short" => HairLength::Short,
    "medium" => HairLength::Medium,
    "long" => HairLength::Long,
    "very_long" => HairLength::VeryLong,
});

impl_from_str!(HairThickness, "hair thickness", {
    "fine" => HairThickness::Fine,
    "medium" => HairThickness::Medium,
    "thick" => HairThickness::Thick,
});

impl_from_str!(HairTexture, "hair texture", {
    "straight" => HairTexture::Straight,
    "wavy" => HairTexture::Wavy,
    "curly" => HairTexture::Curly,
    "coily" => HairTexture::Coily,
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HairProfile {
    #[serde(default)]
    pub length: HairLength,
    #[serde(default)]
    pub thickness: HairThickness,
    #[serde(default)]
    pub texture: HairTexture,
}

impl HairProfile {
    /// Apply the three multipliers to `minutes`, in exact integer arithmetic
    /// (seconds are kept so that rounding happens only once, at the end).
    fn scale_seconds(&self, minutes: u32) -> u64 {
        let percent = u64::from(self.length.factor())
            * u64::from(self.thickness.factor())
            * u64::from(self.texture.factor());
        (u64::from(minutes) * 60 * percent).div_ceil(1_000_000)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceKind {
    Haircut,
    Coloring,
    Styling,
    Beard,
    Shave,
    Other,
}

impl ServiceKind {
    pub fn is_hair_dependent(self) -> bool {
        matches!(
            self,
            ServiceKind::Haircut | ServiceKind::Coloring | ServiceKind::Styling
        )
    }
}

impl std::str::FromStr for ServiceKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "haircut" | "cut" => Ok(ServiceKind::Haircut),
            "coloring" | "colouring" | "color" => Ok(ServiceKind::Coloring),
            "styling" => Ok(ServiceKind::Styling),
            "beard" => Ok(ServiceKind::Beard),
            "shave" => Ok(ServiceKind::Shave),
            "other" => Ok(ServiceKind::Other),
            other => Err(format!("unknown service kind '{other}'")),
        }
    }
}

/// A catalogue service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub name: String,
    pub kind: ServiceKind,
    pub base_minutes: u32,
}

impl Service {
    pub fn new(name: impl Into<String>, kind: ServiceKind, base_minutes: u32) -> Self {
        Self {
            name: name.into(),
            kind,
            base_minutes,
        }
    }

    fn raw_seconds(&self, profile: Option<&HairProfile>) -> u64 {
        match profile {
            Some(p) if self.kind.is_hair_dependent() => p.scale_seconds(self.base_minutes),
            _ => u64::from(self.base_minutes) * 60,
        }
    }
}

/// Estimate how long `service` takes for a client.
///
/// # Errors
///
/// Returns [`HoursError::InvalidDuration`] if `quantum_minutes` is zero.
///
/// # Examples
///
/// ```
/// use shop_hours::{estimate_duration, HairLength, HairProfile, Service, ServiceKind};
///
/// let cut = Service::new("Coupe", ServiceKind::Haircut, 30);
/// let profile = HairProfile { length: HairLength::Long, ..Default::default() };
/// // 30 × 1.4 = 42 minutes, rounded up to the 15-minute grid.
/// assert_eq!(estimate_duration(&cut, Some(&profile), 15).unwrap(), 45);
/// ```
pub fn estimate_duration(
    service: &Service,
    profile: Option<&HairProfile>,
    quantum_minutes: u32,
) -> Result<u32> {
    round_to_quantum(service.raw_seconds(profile), quantum_minutes)
}

/// Estimate a multi-service booking. Raw estimates are summed first, then
/// rounded once.
pub fn estimate_total(
    services: &[Service],
    profile: Option<&HairProfile>,
    quantum_minutes: u32,
) -> Result<u32> {
    let total = services.iter().map(|s| s.raw_seconds(profile)).sum();
    round_to_quantum(total, quantum_minutes)
}

fn round_to_quantum(seconds: u64, quantum_minutes: u32) -> Result<u32> {
    if quantum_minutes == 0 {
        return Err(HoursError::InvalidDuration(
            "rounding quantum must be positive".to_string(),
        ));
    }
    let quantum = u64::from(quantum_minutes) * 60;
    let minutes = seconds.div_ceil(quantum) * u64::from(quantum_minutes);
    u32::try_from(minutes)
        .map_err(|_| HoursError::InvalidDuration(format!("estimate of {minutes} minutes overflows")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn cut(base: u32) -> Service {
        Service::new("Coupe homme", ServiceKind::Haircut, base)
    }

    #[test]
    fn test_no_profile_keeps_base_rounded() {
        assert_eq!(estimate_duration(&cut(30), None, 15).unwrap(), 30);
        assert_eq!(estimate_duration(&cut(20), None, 15).unwrap(), 30);
        assert_eq!(estimate_duration(&cut(20), None, 5).unwrap(), 20);
    }

    #[test]
    fn test_default_profile_is_neutral() {
        let p = HairProfile::default();
        assert_eq!(estimate_duration(&cut(30), Some(&p), 5).unwrap(), 30);
    }

    #[test]
    fn test_multipliers_compound() {
        let p = HairProfile {
            length: HairLength::VeryLong,
            thickness: HairThickness::Thick,
            texture: HairTexture::Coily,
        };
        // 30 × 1.6 × 1.2 × 1.3 = 74.88 → 75 on a 5-minute grid
        assert_eq!(estimate_duration(&cut(30), Some(&p), 5).unwrap(), 75);
        assert_eq!(estimate_duration(&cut(30), Some(&p), 15).unwrap(), 75);
        assert_eq!(estimate_duration(&cut(30), Some(&p), 1).unwrap(), 75);
    }

    #[test]
    fn test_fine_hair_can_shorten() {
        let p = HairProfile {
            thickness: HairThickness::Fine,
            ..Default::default()
        };
        // 60 × 0.9 = 54 → 55
        assert_eq!(estimate_duration(&cut(60), Some(&p), 5).unwrap(), 55);
    }

    #[test]
    fn test_beard_ignores_profile() {
        let beard = Service::new("Taille de barbe", ServiceKind::Beard, 20);
        let p = HairProfile {
            length: HairLength::VeryLong,
            ..Default::default()
        };
        assert_eq!(estimate_duration(&beard, Some(&p), 5).unwrap(), 20);
    }

    #[test]
    fn test_zero_base_is_zero() {
        assert_eq!(estimate_duration(&cut(0), None, 15).unwrap(), 0);
    }

    #[test]
    fn test_zero_quantum_is_error() {
        let err = estimate_duration(&cut(30), None, 0).unwrap_err();
        assert!(matches!(err, HoursError::InvalidDuration(_)));
    }

    #[test]
    fn test_total_rounds_once() {
        let p = HairProfile {
            length: HairLength::Medium,
            ..Default::default()
        };
        // haircut 25 × 1.2 = 30, beard 10 → 40, one rounding → 45
        let services = vec![
            cut(25),
            Service::new("Barbe", ServiceKind::Beard, 10),
        ];
        assert_eq!(estimate_total(&services, Some(&p), 15).unwrap(), 45);
        assert_eq!(estimate_total(&[], Some(&p), 15).unwrap(), 0);
    }

    #[test]
    fn test_profile_deserializes_with_defaults() {
        let p: HairProfile = serde_json::from_str(r#"{"length":"very_long"}"#).unwrap();
        assert_eq!(p.length, HairLength::VeryLong);
        assert_eq!(p.thickness, HairThickness::Medium);
        assert_eq!(p.texture, HairTexture::Straight);
    }

    #[test]
    fn test_hair_attributes_from_str() {
        assert_eq!("very-long".parse::<HairLength>(), Ok(HairLength::VeryLong));
        assert_eq!("Thick".parse::<HairThickness>(), Ok(HairThickness::Thick));
        assert_eq!("coily".parse::<HairTexture>(), Ok(HairTexture::Coily));
        assert!("bald".parse::<HairLength>().is_err());
    }

    #[test]
    fn test_service_kind_from_str() {
        assert_eq!("Cut".parse::<ServiceKind>(), Ok(ServiceKind::Haircut));
        assert!("massage".parse::<ServiceKind>().is_err());
    }

    fn any_length() -> impl Strategy<Value = HairLength> {
        prop_oneof![
            Just(HairLength::Short),
            Just(HairLength::Medium),
            Just(HairLength::Long),
            Just(HairLength::VeryLong),
        ]
    }

    fn non_fine_thickness() -> impl Strategy<Value = HairThickness> {
        prop_oneof![Just(HairThickness::Medium), Just(HairThickness::Thick)]
    }

    fn any_texture() -> impl Strategy<Value = HairTexture> {
        prop_oneof![
            Just(HairTexture::Straight),
            Just(HairTexture::Wavy),
            Just(HairTexture::Curly),
            Just(HairTexture::Coily),
        ]
    }

    proptest! {
        #[test]
        fn prop_estimate_aligned_and_not_shorter(
            base in 0u32..=480,
            quantum in 1u32..=60,
            length in any_length(),
            thickness in non_fine_thickness(),
            texture in any_texture(),
        ) {
            let profile = HairProfile { length, thickness, texture };
            let estimate = estimate_duration(&cut(base), Some(&profile), quantum).unwrap();
            prop_assert_eq!(estimate % quantum, 0);
            prop_assert!(estimate >= base);
            prop_assert!(estimate < base * 3 + quantum);
        }
    }
}
