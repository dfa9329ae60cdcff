//! Pattern catalog - ordered tiers of compiled keyword patterns.

use regex::{Regex, RegexBuilder};
use tracing::info;

use crate::error::CatalogError;
use crate::types::config::{CatalogSpec, TierSpec};

/// One compiled pattern, keeping its source text for findings.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    pub source: String,
    pub regex: Regex,
}

/// One compiled tier.
#[derive(Debug, Clone)]
pub struct Tier {
    pub name: String,
    pub color: String,
    pub patterns: Vec<CompiledPattern>,
}

/// Compiled, immutable catalog. Tier order is priority order.
#[derive(Debug, Clone)]
pub struct PatternCatalog {
    tiers: Vec<Tier>,
}

impl PatternCatalog {
    /// Compile every pattern case-insensitively with `.` matching newlines.
    ///
    /// The first invalid pattern aborts the load.
    pub fn compile(spec: &CatalogSpec) -> Result<Self, CatalogError> {
        if spec.tiers.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut tiers = Vec::with_capacity(spec.tiers.len());
        for (name, tier) in &spec.tiers {
            if tier.patterns.is_empty() {
                return Err(CatalogError::EmptyTier(name.clone()));
            }
            let patterns = tier
                .patterns
                .iter()
                .map(|source| compile_pattern(name, source))
                .collect::<Result<Vec<_>, _>>()?;
            tiers.push(Tier {
                name: name.clone(),
                color: tier.color.clone(),
                patterns,
            });
        }

        let catalog = Self { tiers };
        info!(
            tiers = catalog.tiers.len(),
            patterns = catalog.pattern_count(),
            "Pattern catalog compiled"
        );
        Ok(catalog)
    }

    pub fn tiers(&self) -> &[Tier] {
        &self.tiers
    }

    pub fn tier(&self, name: &str) -> Option<&Tier> {
        self.tiers.iter().find(|t| t.name == name)
    }

    pub fn pattern_count(&self) -> usize {
        self.tiers.iter().map(|t| t.patterns.len()).sum()
    }
}

fn compile_pattern(tier: &str, source: &str) -> Result<CompiledPattern, CatalogError> {
    let regex = RegexBuilder::new(source)
        .case_insensitive(true)
        .dot_matches_new_line(true)
        .build()
        .map_err(|source_err| CatalogError::InvalidPattern {
            tier: tier.to_string(),
            pattern: source.to_string(),
            source: source_err,
        })?;
    Ok(CompiledPattern {
        source: source.to_string(),
        regex,
    })
}

/// The built-in four-tier catalog, most severe first.
pub fn default_catalog_spec() -> CatalogSpec {
    CatalogSpec::new()
        .with_tier(
            "priority_1",
            TierSpec::new(
                "FF0000",
                &[
                    r"\bSteve\s+Hamm\b",
                    r"\bS\.\s*Hamm\b",
                    r"\bHamm\b",
                    r"\bethics\s+training\b",
                    r"\babuse\s+of\s+(authority|position)\b",
                    r"\bconflict\s+of\s+interest\b",
                    r"\bemployee\s+misconduct\b",
                    r"\bhighway\s+department\b.*?\b(complaint|incident|investigation)\b",
                    r"\bG-K\s+Broncos\b",
                    r"\bBroncos\b",
                    r"\bKingston\s+Park\b",
                    r"\btrailer\s+removal\b",
                ],
            ),
        )
        .with_tier(
            "priority_2",
            TierSpec::new(
                "FFA500",
                &[
                    r"\bethics\b.*?\b(training|policy|violation)\b",
                    r"\bcode\s+of\s+conduct\b",
                    r"\bemployee\s+handbook\b",
                    r"\bdisciplinary\s+action\b",
                    r"\b(grievance|complaint)\b",
                    r"\binappropriate\s+use\b",
                    r"\bpersonal\s+use\b.*?\b(vehicle|position|authority)\b",
                    r"\bsheriff\b.*?\bhighway\b",
                    r"\b(intimidation|threatening)\b",
                    r"\bretaliation\b",
                ],
            ),
        )
        .with_tier(
            "priority_3",
            TierSpec::new(
                "FFFF00",
                &[
                    r"\boversight\b",
                    r"\baccountability\b",
                    r"\binternal\s+investigation\b",
                    r"\boutside\s+counsel\b",
                    r"\blitigation\s+hold\b",
                    r"\b(lawsuit|legal\s+action)\b",
                    r"\bsettlement\b",
                    r"\binsurance\s+claim\b",
                    r"\b(FOIA|freedom\s+of\s+information)\b",
                    r"\bpublic\s+comment\b.*?\b(complaint|concern)\b",
                ],
            ),
        )
        .with_tier(
            "priority_4",
            TierSpec::new(
                "00FF00",
                &[
                    r"\btraining\s+budget\b",
                    r"\bprofessional\s+development\b",
                    r"\bmandatory\s+training\b",
                    r"\bcompliance\s+training\b",
                    r"\bharassment\s+training\b",
                    r"\bdiscrimination\b",
                    r"\bhostile\s+work\s+environment\b",
                ],
            ),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog_compiles_in_order() {
        let catalog = PatternCatalog::compile(&default_catalog_spec()).unwrap();
        let names: Vec<_> = catalog.tiers().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["priority_1", "priority_2", "priority_3", "priority_4"]);
        assert_eq!(catalog.pattern_count(), 39);
        assert_eq!(catalog.tier("priority_3").unwrap().color, "FFFF00");
    }

    #[test]
    fn test_invalid_pattern_fails_at_load() {
        let spec = CatalogSpec::new()
            .with_tier("ok", TierSpec::new("00FF00", &[r"\bfine\b"]))
            .with_tier("bad", TierSpec::new("FF0000", &[r"(unclosed"]));

        match PatternCatalog::compile(&spec).unwrap_err() {
            CatalogError::InvalidPattern { tier, pattern, .. } => {
                assert_eq!(tier, "bad");
                assert_eq!(pattern, "(unclosed");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_empty_catalog_and_tier_rejected() {
        assert!(matches!(
            PatternCatalog::compile(&CatalogSpec::new()),
            Err(CatalogError::Empty)
        ));
        let spec = CatalogSpec::new().with_tier("hollow", TierSpec::new("FFFFFF", &[]));
        assert!(matches!(
            PatternCatalog::compile(&spec),
            Err(CatalogError::EmptyTier(name)) if name == "hollow"
        ));
    }

    #[test]
    fn test_flags_are_case_insensitive_and_dotall() {
        let spec = CatalogSpec::new().with_tier(
            "t",
            TierSpec::new("FF0000", &[r"\bsheriff\b.*?\bhighway\b"]),
        );
        let catalog = PatternCatalog::compile(&spec).unwrap();
        let regex = &catalog.tiers()[0].patterns[0].regex;
        assert!(regex.is_match("The SHERIFF\nspoke about the\nHighway"));
    }
}
