//! Pixel mappers: pure translations from the coordinates the caller draws in
//! to the physical wiring order of chained and parallel panels.
//!
//! Mappers are named, optionally parameterized, and composed from a
//! semicolon-separated configuration string such as `"U-mapper;Rotate:90"`.
//! The first mapper in the list is the one closest to the caller's canvas.
//! Unknown names fail at matrix construction, never at draw time.

use crate::error::Error;

pub(crate) trait PixelMapper: Send + Sync {
    fn name(&self) -> &'static str;

    /// Visible size exposed to the caller, given the size of the underlying
    /// stage.
    fn map_size(&self, width: usize, height: usize) -> (usize, usize);

    /// Translate a visible coordinate into the underlying stage, whose size
    /// is (`width`, `height`).
    fn map(&self, width: usize, height: usize, x: usize, y: usize) -> (usize, usize);
}

struct RotateMapper {
    angle: u32,
}

impl PixelMapper for RotateMapper {
    fn name(&self) -> &'static str {
        "Rotate"
    }

    fn map_size(&self, width: usize, height: usize) -> (usize, usize) {
        match self.angle {
            90 | 270 => (height, width),
            _ => (width, height),
        }
    }

    fn map(&self, width: usize, height: usize, x: usize, y: usize) -> (usize, usize) {
        match self.angle {
            90 => (y, height - 1 - x),
            180 => (width - 1 - x, height - 1 - y),
            270 => (width - 1 - y, x),
            _ => (x, y),
        }
    }
}

struct MirrorMapper {
    horizontal: bool,
}

impl PixelMapper for MirrorMapper {
    fn name(&self) -> &'static str {
        "Mirror"
    }

    fn map_size(&self, width: usize, height: usize) -> (usize, usize) {
        (width, height)
    }

    fn map(&self, width: usize, height: usize, x: usize, y: usize) -> (usize, usize) {
        if self.horizontal {
            (width - 1 - x, y)
        } else {
            (x, height - 1 - y)
        }
    }
}

/// Maps a single long chain arranged in a U shape: the second half of the
/// chain is mounted upside-down above the first. Halves the visible width and
/// doubles the visible height per parallel slab.
struct UMapper {
    chain: usize,
    parallel: usize,
}

impl PixelMapper for UMapper {
    fn name(&self) -> &'static str {
        "U-mapper"
    }

    fn map_size(&self, width: usize, height: usize) -> (usize, usize) {
        (width / 2, height * 2)
    }

    fn map(&self, width: usize, height: usize, x: usize, y: usize) -> (usize, usize) {
        let panel_height = height / self.parallel;
        let visible_width = (width / self.chain) * (self.chain / 2);
        let slab_height = 2 * panel_height;
        let base_y = (y / slab_height) * panel_height;
        let y = y % slab_height;
        let (x, y) = if y < panel_height {
            (x + width / 2, y)
        } else {
            (visible_width - 1 - x, slab_height - 1 - y)
        };
        (x, base_y + y)
    }
}

fn parse_one(
    spec: &str,
    chain: usize,
    parallel: usize,
) -> Result<Box<dyn PixelMapper>, Error> {
    let (name, param) = match spec.split_once(':') {
        Some((name, param)) => (name.trim(), Some(param.trim())),
        None => (spec.trim(), None),
    };
    match name {
        "Rotate" => {
            let angle: u32 = param
                .unwrap_or("0")
                .parse()
                .map_err(|_| Error::Config(format!("bad Rotate parameter {param:?}")))?;
            if angle % 90 != 0 || angle >= 360 {
                return Err(Error::Config(format!(
                    "Rotate angle must be one of 0/90/180/270, got {angle}"
                )));
            }
            Ok(Box::new(RotateMapper { angle }))
        }
        "Mirror" => {
            let horizontal = match param.unwrap_or("H") {
                "H" | "h" => true,
                "V" | "v" => false,
                other => {
                    return Err(Error::Config(format!(
                        "Mirror parameter must be H or V, got {other:?}"
                    )))
                }
            };
            Ok(Box::new(MirrorMapper { horizontal }))
        }
        "U-mapper" => {
            if chain < 2 || chain % 2 != 0 {
                return Err(Error::Config(format!(
                    "U-mapper requires an even chain of at least 2, got {chain}"
                )));
            }
            Ok(Box::new(UMapper { chain, parallel }))
        }
        other => Err(Error::Config(format!("unknown pixel mapper {other:?}"))),
    }
}

/// A parsed mapper chain together with the per-stage sizes, ready to
/// translate visible coordinates all the way down to panel wiring.
pub(crate) struct MapperChain {
    mappers: Vec<Box<dyn PixelMapper>>,
    /// `stages[i]` is the size of the stage below `mappers[i]`;
    /// the final visible size is kept separately.
    stages: Vec<(usize, usize)>,
    visible: (usize, usize),
}

impl core::fmt::Debug for MapperChain {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MapperChain")
            .field("stages", &self.stages)
            .field("visible", &self.visible)
            .finish_non_exhaustive()
    }
}

impl MapperChain {
    /// Parse `config` (may be empty/absent) against the physical matrix size.
    pub(crate) fn parse(
        config: Option<&str>,
        matrix_width: usize,
        matrix_height: usize,
        chain: usize,
        parallel: usize,
    ) -> Result<Self, Error> {
        let mut mappers = Vec::new();
        if let Some(config) = config {
            for spec in config.split(';') {
                let spec = spec.trim();
                if spec.is_empty() {
                    continue;
                }
                mappers.push(parse_one(spec, chain, parallel)?);
            }
        }
        // Sizes compose bottom-up: the last mapper listed sits directly on
        // the panel wiring, the first one faces the caller.
        let mut size = (matrix_width, matrix_height);
        let mut stages = vec![(0, 0); mappers.len()];
        for (i, mapper) in mappers.iter().enumerate().rev() {
            stages[i] = size;
            size = mapper.map_size(size.0, size.1);
        }
        Ok(Self {
            mappers,
            stages,
            visible: size,
        })
    }

    /// The canvas size exposed to callers.
    pub(crate) fn size(&self) -> (usize, usize) {
        self.visible
    }

    /// Translate a visible coordinate into physical matrix coordinates.
    pub(crate) fn map(&self, x: usize, y: usize) -> (usize, usize) {
        let mut p = (x, y);
        for (mapper, &(w, h)) in self.mappers.iter().zip(&self.stages) {
            p = mapper.map(w, h, p.0, p.1);
        }
        p
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_is_identity() {
        let chain = MapperChain::parse(None, 64, 32, 1, 1).unwrap();
        assert_eq!(chain.size(), (64, 32));
        assert_eq!(chain.map(10, 20), (10, 20));
        let chain = MapperChain::parse(Some(""), 64, 32, 1, 1).unwrap();
        assert_eq!(chain.size(), (64, 32));
    }

    #[test]
    fn unknown_mapper_fails_at_parse_time() {
        let err = MapperChain::parse(Some("Spiral"), 64, 32, 1, 1).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("Spiral"));
    }

    #[test]
    fn rotate_90_swaps_and_maps_corners() {
        let chain = MapperChain::parse(Some("Rotate:90"), 64, 32, 1, 1).unwrap();
        assert_eq!(chain.size(), (32, 64));
        // visible top-left lands on the physical bottom-left column
        assert_eq!(chain.map(0, 0), (0, 31));
        assert_eq!(chain.map(31, 0), (0, 0));
        assert_eq!(chain.map(0, 63), (63, 31));
    }

    #[test]
    fn rotate_rejects_odd_angles() {
        assert!(MapperChain::parse(Some("Rotate:45"), 64, 32, 1, 1).is_err());
        assert!(MapperChain::parse(Some("Rotate:360"), 64, 32, 1, 1).is_err());
        assert!(MapperChain::parse(Some("Rotate:x"), 64, 32, 1, 1).is_err());
    }

    #[test]
    fn mirror_flips() {
        let chain = MapperChain::parse(Some("Mirror:H"), 8, 4, 1, 1).unwrap();
        assert_eq!(chain.map(0, 0), (7, 0));
        let chain = MapperChain::parse(Some("Mirror:V"), 8, 4, 1, 1).unwrap();
        assert_eq!(chain.map(0, 0), (0, 3));
        assert!(MapperChain::parse(Some("Mirror:Q"), 8, 4, 1, 1).is_err());
    }

    #[test]
    fn u_mapper_folds_the_chain() {
        // two chained 32x16 panels: physical 64x16, visible 32x32
        let chain = MapperChain::parse(Some("U-mapper"), 64, 16, 2, 1).unwrap();
        assert_eq!(chain.size(), (32, 32));
        // top half of the visible space is the far (second) half of the chain
        assert_eq!(chain.map(0, 0), (32, 0));
        assert_eq!(chain.map(31, 15), (63, 15));
        // bottom half is the near half, reversed in both axes
        assert_eq!(chain.map(0, 16), (31, 15));
        assert_eq!(chain.map(31, 31), (0, 0));
    }

    #[test]
    fn u_mapper_requires_even_chain() {
        assert!(MapperChain::parse(Some("U-mapper"), 32, 16, 1, 1).is_err());
        assert!(MapperChain::parse(Some("U-mapper"), 96, 16, 3, 1).is_err());
    }

    #[test]
    fn chains_compose_first_mapper_facing_the_caller() {
        // U-mapper then rotate the folded display
        let chain = MapperChain::parse(Some("Rotate:90;U-mapper"), 64, 16, 2, 1).unwrap();
        // U-mapper gives 32x32; Rotate:90 keeps 32x32
        assert_eq!(chain.size(), (32, 32));
        // rotate applies first (caller-facing), then the U fold
        let rotated = chain.map(0, 0);
        let u_only = MapperChain::parse(Some("U-mapper"), 64, 16, 2, 1).unwrap();
        assert_eq!(rotated, u_only.map(0, 31));
    }
}
