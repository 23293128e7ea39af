//! Selection-snapping and rectangle-size steps derived from user mods and source subsampling.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::X => f.write_str("x"),
            Self::Y => f.write_str("y"),
        }
    }
}

/// Chroma-subsampling factor pair of one source, each a power of two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subsampling {
    pub x: u32,
    pub y: u32,
}

impl Subsampling {
    pub const NONE: Self = Self { x: 1, y: 1 };

    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    pub const fn on(self, axis: Axis) -> u32 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
        }
    }
}

impl Default for Subsampling {
    fn default() -> Self {
        Self::NONE
    }
}

/// Per-source input to the resolver; failed sources never contribute to the maxima.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceSubsampling {
    Loaded(Subsampling),
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlignmentRequest {
    pub mod_x: i32,
    pub mod_y: i32,
    pub respect_x_subsampling: bool,
    pub respect_y_subsampling: bool,
    pub ignore_subsampling: bool,
}

impl Default for AlignmentRequest {
    fn default() -> Self {
        Self {
            mod_x: 2,
            mod_y: 2,
            respect_x_subsampling: true,
            respect_y_subsampling: true,
            ignore_subsampling: false,
        }
    }
}

impl AlignmentRequest {
    const fn respects(&self, axis: Axis) -> bool {
        if self.ignore_subsampling {
            return false;
        }
        match axis {
            Axis::X => self.respect_x_subsampling,
            Axis::Y => self.respect_y_subsampling,
        }
    }

    const fn requested_mod(&self, axis: Axis) -> i32 {
        match axis {
            Axis::X => self.mod_x,
            Axis::Y => self.mod_y,
        }
    }
}

/// Immutable per-session alignment: `mod_*` constrains sizes, `subs_*` constrains positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlignmentConfig {
    pub mod_x: u32,
    pub mod_y: u32,
    pub subs_x: u32,
    pub subs_y: u32,
}

impl AlignmentConfig {
    pub const UNALIGNED: Self = Self {
        mod_x: 1,
        mod_y: 1,
        subs_x: 1,
        subs_y: 1,
    };

    pub const fn new(mod_x: u32, mod_y: u32, subs_x: u32, subs_y: u32) -> Self {
        Self {
            mod_x,
            mod_y,
            subs_x,
            subs_y,
        }
    }

    /// Step used when a corner or edge is nudged from the keyboard.
    pub fn edit_step(&self, axis: Axis) -> u32 {
        match axis {
            Axis::X => self.mod_x.max(self.subs_x),
            Axis::Y => self.mod_y.max(self.subs_y),
        }
    }

    pub const fn subs(&self, axis: Axis) -> u32 {
        match axis {
            Axis::X => self.subs_x,
            Axis::Y => self.subs_y,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignmentCorrection {
    /// Requested mod was zero or negative and was normalized.
    ModNormalized {
        axis: Axis,
        requested: i32,
        corrected: u32,
    },
    /// Mod raised so that sizes stay legal for the subsampled sources.
    ModRaised {
        axis: Axis,
        requested: u32,
        corrected: u32,
    },
    /// A source reported a factor that is not a power of two.
    SubsamplingNormalized {
        source: usize,
        axis: Axis,
        reported: u32,
        corrected: u32,
    },
}

impl fmt::Display for AlignmentCorrection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ModNormalized {
                axis,
                requested,
                corrected,
            } => write!(
                f,
                "mod_{axis}={corrected}, corrected from invalid mod_{axis}={requested}"
            ),
            Self::ModRaised {
                axis,
                requested,
                corrected,
            } => write!(
                f,
                "mod_{axis}={corrected}, corrected from mod_{axis}={requested}, cannot be less than subsampling"
            ),
            Self::SubsamplingNormalized {
                source,
                axis,
                reported,
                corrected,
            } => write!(
                f,
                "clip{} subsampling_{axis}={reported} is not a power of two, using {corrected}",
                source + 1
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignmentResolution {
    pub config: AlignmentConfig,
    /// Largest factors seen across loaded sources, regardless of the respect flags.
    pub max_subsampling: Subsampling,
    pub excluded_sources: Vec<usize>,
    pub corrections: Vec<AlignmentCorrection>,
}

pub fn resolve_alignment(
    request: AlignmentRequest,
    sources: &[SourceSubsampling],
) -> AlignmentResolution {
    let mut corrections = Vec::new();
    let mut excluded_sources = Vec::new();
    let mut max_subsampling = Subsampling::NONE;

    for (index, source) in sources.iter().enumerate() {
        let SourceSubsampling::Loaded(factors) = source else {
            tracing::warn!(source = index + 1, "source loaded with error; excluded from alignment");
            excluded_sources.push(index);
            continue;
        };
        let x = normalize_factor(index, Axis::X, factors.x, &mut corrections);
        let y = normalize_factor(index, Axis::Y, factors.y, &mut corrections);
        tracing::debug!(source = index + 1, x, y, "source subsampling");
        max_subsampling.x = max_subsampling.x.max(x);
        max_subsampling.y = max_subsampling.y.max(y);
    }

    let (mod_x, subs_x) = resolve_axis(Axis::X, request, max_subsampling, &mut corrections);
    let (mod_y, subs_y) = resolve_axis(Axis::Y, request, max_subsampling, &mut corrections);
    let config = AlignmentConfig::new(mod_x, mod_y, subs_x, subs_y);

    if request.ignore_subsampling && max_subsampling != Subsampling::NONE {
        tracing::warn!(
            "subsampling ignored; selected points may fall inside chroma blocks and fail downstream"
        );
    }
    for correction in &corrections {
        tracing::warn!("{correction}");
    }
    tracing::info!(
        mod_x,
        mod_y,
        subs_x,
        subs_y,
        "alignment resolved: positions snap to subs, sizes snap to mods"
    );

    AlignmentResolution {
        config,
        max_subsampling,
        excluded_sources,
        corrections,
    }
}

fn resolve_axis(
    axis: Axis,
    request: AlignmentRequest,
    max_subsampling: Subsampling,
    corrections: &mut Vec<AlignmentCorrection>,
) -> (u32, u32) {
    let requested = request.requested_mod(axis);
    let mut modulus = requested.unsigned_abs().max(1);
    if i64::from(requested) != i64::from(modulus) {
        corrections.push(AlignmentCorrection::ModNormalized {
            axis,
            requested,
            corrected: modulus,
        });
    }

    if !request.respects(axis) {
        return (modulus, 1);
    }

    let factor = max_subsampling.on(axis);
    if modulus < factor {
        corrections.push(AlignmentCorrection::ModRaised {
            axis,
            requested: modulus,
            corrected: factor,
        });
        modulus = factor;
    }
    (modulus, factor)
}

fn normalize_factor(
    source: usize,
    axis: Axis,
    reported: u32,
    corrections: &mut Vec<AlignmentCorrection>,
) -> u32 {
    if reported.is_power_of_two() {
        return reported;
    }
    let corrected = reported.max(1).next_power_of_two();
    corrections.push(AlignmentCorrection::SubsamplingNormalized {
        source,
        axis,
        reported,
        corrected,
    });
    corrected
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded(x: u32, y: u32) -> SourceSubsampling {
        SourceSubsampling::Loaded(Subsampling::new(x, y))
    }

    #[test]
    fn respected_subsampling_raises_mod_and_sets_step() {
        let request = AlignmentRequest {
            mod_x: 1,
            mod_y: 2,
            ..Default::default()
        };
        let resolution = resolve_alignment(request, &[loaded(1, 1), loaded(2, 2), loaded(4, 1)]);

        assert_eq!(resolution.config, AlignmentConfig::new(4, 2, 4, 2));
        assert!(resolution.config.mod_x >= resolution.config.subs_x);
        assert!(resolution.config.mod_y >= resolution.config.subs_y);
        assert_eq!(
            resolution.corrections,
            vec![AlignmentCorrection::ModRaised {
                axis: Axis::X,
                requested: 1,
                corrected: 4,
            }]
        );
    }

    #[test]
    fn ignore_override_collapses_steps_and_keeps_mods() {
        let request = AlignmentRequest {
            mod_x: 1,
            mod_y: 1,
            ignore_subsampling: true,
            ..Default::default()
        };
        let resolution = resolve_alignment(request, &[loaded(2, 2)]);

        assert_eq!(resolution.config, AlignmentConfig::UNALIGNED);
        assert_eq!(resolution.max_subsampling, Subsampling::new(2, 2));
        assert!(resolution.corrections.is_empty());
    }

    #[test]
    fn respect_flags_are_independent_per_axis() {
        let request = AlignmentRequest {
            mod_x: 1,
            mod_y: 1,
            respect_x_subsampling: false,
            ..Default::default()
        };
        let resolution = resolve_alignment(request, &[loaded(2, 2)]);
        assert_eq!(resolution.config, AlignmentConfig::new(1, 2, 1, 2));
    }

    #[test]
    fn failed_sources_are_excluded_and_reported() {
        let resolution = resolve_alignment(
            AlignmentRequest::default(),
            &[SourceSubsampling::Failed, loaded(1, 1), loaded(2, 1)],
        );
        assert_eq!(resolution.excluded_sources, vec![0]);
        assert_eq!(resolution.config, AlignmentConfig::new(2, 2, 2, 1));
    }

    #[test]
    fn invalid_mods_and_factors_are_corrected_with_warnings() {
        let request = AlignmentRequest {
            mod_x: 0,
            mod_y: -8,
            ..Default::default()
        };
        let resolution = resolve_alignment(request, &[loaded(3, 1)]);

        assert_eq!(resolution.config, AlignmentConfig::new(4, 8, 4, 1));
        assert!(resolution
            .corrections
            .contains(&AlignmentCorrection::SubsamplingNormalized {
                source: 0,
                axis: Axis::X,
                reported: 3,
                corrected: 4,
            }));
        assert!(resolution
            .corrections
            .contains(&AlignmentCorrection::ModNormalized {
                axis: Axis::Y,
                requested: -8,
                corrected: 8,
            }));
    }

    #[test]
    fn edit_step_uses_larger_of_mod_and_subs() {
        let config = AlignmentConfig::new(2, 8, 4, 2);
        assert_eq!(config.edit_step(Axis::X), 4);
        assert_eq!(config.edit_step(Axis::Y), 8);
    }
}
