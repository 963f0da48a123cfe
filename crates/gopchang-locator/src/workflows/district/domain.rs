use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DistrictId(pub String);

impl DistrictId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DistrictId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Raw inputs per district. Every field is optional because the master
/// layer is a left join and auxiliary sources may lack a row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DistrictMetrics {
    pub night_population: Option<f64>,
    pub flow_population: Option<f64>,
    pub facility_count: Option<f64>,
    pub competitor_count: Option<f64>,
    pub resident_total: Option<f64>,
    pub resident_male: Option<f64>,
    pub resident_female: Option<f64>,
    pub avg_household_income: Option<f64>,
    pub korean_food_sales: Option<f64>,
}

/// Position in the target CRS plus WGS84 lon/lat for map widgets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub x: f64,
    pub y: f64,
    pub lon: f64,
    pub lat: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    NightTraffic,
    SalesDensity,
    Competition,
    Vibrancy,
    AlcoholAffinity,
}

impl Dimension {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::NightTraffic,
            Self::SalesDensity,
            Self::Competition,
            Self::Vibrancy,
            Self::AlcoholAffinity,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::NightTraffic => "야간유동인구",
            Self::SalesDensity => "매출밀도",
            Self::Competition => "경쟁우위",
            Self::Vibrancy => "상권활성도",
            Self::AlcoholAffinity => "주류친화도",
        }
    }

    /// Column header used in the exported top-N table.
    pub const fn column(self) -> &'static str {
        match self {
            Self::NightTraffic => "T1_점수_v2",
            Self::SalesDensity => "T2_점수_v2",
            Self::Competition => "C1_점수_v2",
            Self::Vibrancy => "C2_점수_v2",
            Self::AlcoholAffinity => "E1_점수_v2",
        }
    }

    /// Raw value feeding this dimension. Larger is always better.
    pub fn raw_value(self, metrics: &DistrictMetrics) -> Option<f64> {
        let value = match self {
            Self::NightTraffic => metrics.night_population.or(metrics.flow_population),
            Self::SalesDensity => metrics.korean_food_sales,
            Self::Competition => metrics
                .flow_population
                .zip(metrics.competitor_count)
                .map(|(flow, stores)| flow / (stores.max(0.0) + 1.0)),
            Self::Vibrancy => metrics.facility_count,
            Self::AlcoholAffinity => metrics
                .night_population
                .zip(metrics.flow_population)
                .filter(|(_, flow)| *flow > 0.0)
                .map(|(night, flow)| night / flow),
        };
        value.filter(|raw| raw.is_finite())
    }
}

/// One 0–100 score per dimension.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SubScores {
    pub night_traffic: f64,
    pub sales_density: f64,
    pub competition: f64,
    pub vibrancy: f64,
    pub alcohol_affinity: f64,
}

impl SubScores {
    pub fn get(&self, dimension: Dimension) -> f64 {
        match dimension {
            Dimension::NightTraffic => self.night_traffic,
            Dimension::SalesDensity => self.sales_density,
            Dimension::Competition => self.competition,
            Dimension::Vibrancy => self.vibrancy,
            Dimension::AlcoholAffinity => self.alcohol_affinity,
        }
    }

    pub fn set(&mut self, dimension: Dimension, value: f64) {
        let slot = match dimension {
            Dimension::NightTraffic => &mut self.night_traffic,
            Dimension::SalesDensity => &mut self.sales_density,
            Dimension::Competition => &mut self.competition,
            Dimension::Vibrancy => &mut self.vibrancy,
            Dimension::AlcoholAffinity => &mut self.alcohol_affinity,
        };
        *slot = value;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Archetype {
    PremiumBusiness,
    YouthCulture,
    UniversityArea,
    TouristTraditional,
    RegionalHub,
    Mixed,
}

impl Archetype {
    pub const fn ordered() -> [Self; 6] {
        [
            Self::PremiumBusiness,
            Self::YouthCulture,
            Self::UniversityArea,
            Self::TouristTraditional,
            Self::RegionalHub,
            Self::Mixed,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::PremiumBusiness => "프리미엄 비즈니스",
            Self::YouthCulture => "젊은층 문화",
            Self::UniversityArea => "대학가",
            Self::TouristTraditional => "관광/전통상권",
            Self::RegionalHub => "지역 거점",
            Self::Mixed => "복합상권",
        }
    }

    /// Accepts the snake_case key or the Korean label.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        Self::ordered().into_iter().find(|archetype| {
            archetype.label() == trimmed || archetype.key() == trimmed.to_ascii_lowercase()
        })
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::PremiumBusiness => "premium_business",
            Self::YouthCulture => "youth_culture",
            Self::UniversityArea => "university_area",
            Self::TouristTraditional => "tourist_traditional",
            Self::RegionalHub => "regional_hub",
            Self::Mixed => "mixed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvestmentTier {
    High,
    Mid,
    Low,
}

impl InvestmentTier {
    pub const fn ordered() -> [Self; 3] {
        [Self::High, Self::Mid, Self::Low]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::High => "고투자",
            Self::Mid => "중투자",
            Self::Low => "저투자",
        }
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Mid => "mid",
            Self::Low => "low",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        Self::ordered()
            .into_iter()
            .find(|tier| tier.label() == trimmed || tier.key() == trimmed.to_ascii_lowercase())
    }
}

/// A district as read from the master layer, before scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistrictRecord {
    pub district_id: DistrictId,
    pub district_name: String,
    pub metrics: DistrictMetrics,
    pub coordinates: Option<Coordinates>,
}

/// A fully scored and labelled district row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredDistrict {
    pub district_id: DistrictId,
    pub district_name: String,
    pub metrics: DistrictMetrics,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    pub sub_scores: SubScores,
    pub composite: f64,
    pub archetype: Archetype,
    pub tier: InvestmentTier,
}
