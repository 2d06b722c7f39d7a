//! Composes per-category packers into one flat vector per map.

use tracing::trace;

use super::resample::resample;
use super::selection::primary_flag;
use super::slots::SlotPacker;
use crate::error::{MapSpaceError, Result};
use crate::model::{
    BOMB_SLOTS, BOOST_SLOTS, Category, Curation, DEFAULT_FIELD, DimensionRange, GATE_SLOTS,
    ISLAND_SLOTS, MapExtents, POWERUP_SLOTS, PORTAL_SLOTS, PointElement, RING_POINTS, Ring,
    SPIKE_SLOTS, VectorMap, WALL_POINTS,
};

/// How a category turns its elements into numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Packer {
    /// One ring resampled to `points` vertices: `points × (x, y)`.
    Ring { points: usize },
    /// `slots × (exists, points × (x, y))`, rings ordered by centroid.
    RingSlots { slots: usize, points: usize },
    /// `slots × (exists, x, y[, team])`.
    PointSlots { slots: usize, with_team: bool },
    /// The primary flag only: `(x, y, team)`.
    PrimaryFlag,
}

impl Packer {
    pub fn for_category(category: Category) -> Packer {
        match category {
            Category::OuterWall => Packer::Ring {
                points: WALL_POINTS,
            },
            Category::Islands => Packer::RingSlots {
                slots: ISLAND_SLOTS,
                points: RING_POINTS,
            },
            Category::Gates => Packer::RingSlots {
                slots: GATE_SLOTS,
                points: RING_POINTS,
            },
            Category::Boosts => Packer::PointSlots {
                slots: BOOST_SLOTS,
                with_team: true,
            },
            Category::Bombs => Packer::PointSlots {
                slots: BOMB_SLOTS,
                with_team: false,
            },
            Category::Spikes => Packer::PointSlots {
                slots: SPIKE_SLOTS,
                with_team: false,
            },
            Category::Portals => Packer::PointSlots {
                slots: PORTAL_SLOTS,
                with_team: false,
            },
            Category::Powerups => Packer::PointSlots {
                slots: POWERUP_SLOTS,
                with_team: false,
            },
            Category::Flags => Packer::PrimaryFlag,
        }
    }

    /// Number of represented instances.
    pub fn slot_count(self) -> usize {
        match self {
            Packer::Ring { .. } | Packer::PrimaryFlag => 1,
            Packer::RingSlots { slots, .. } | Packer::PointSlots { slots, .. } => slots,
        }
    }

    /// Numeric fields per instance, existence flag included.
    pub fn slot_width(self) -> usize {
        match self {
            Packer::Ring { points } => points * 2,
            Packer::RingSlots { points, .. } => 1 + points * 2,
            Packer::PointSlots { with_team, .. } => 3 + usize::from(with_team),
            Packer::PrimaryFlag => 3,
        }
    }

    pub fn dimensions(self) -> usize {
        self.slot_count() * self.slot_width()
    }
}

/// Dimension span of each category of the curation, in curation order.
pub fn describe(curation: Curation) -> Vec<DimensionRange> {
    curation
        .categories()
        .iter()
        .map(|&c| DimensionRange(c.name().to_string(), Packer::for_category(c).dimensions()))
        .collect()
}

pub fn total_dimensions(curation: Curation) -> usize {
    describe(curation).iter().map(|r| r.1).sum()
}

/// Curation whose layout matches the given ranges, if any.
pub fn curation_for(ranges: &[DimensionRange]) -> Option<Curation> {
    Curation::ALL
        .into_iter()
        .find(|&c| describe(c).as_slice() == ranges)
}

/// Encode one map. The caller is expected to have applied map selection.
pub fn assemble(map: &VectorMap, curation: Curation) -> Result<Vec<f64>> {
    let expected = total_dimensions(curation);
    let mut vector = Vec::<f64>::with_capacity(expected);

    for &category in curation.categories() {
        let packed = pack_category(map, category)?;
        let declared = Packer::for_category(category).dimensions();
        if packed.len() != declared {
            return Err(MapSpaceError::SchemaViolation(format!(
                "{category} packed {} values, layout declares {declared}",
                packed.len()
            )));
        }
        trace!(map = %map.name, %category, dims = packed.len(), "packed");
        vector.extend(packed);
    }

    if vector.len() != expected {
        return Err(MapSpaceError::SchemaViolation(format!(
            "map vector has {} values, curation {} declares {expected}",
            vector.len(),
            curation.name()
        )));
    }
    Ok(vector)
}

/// Slice a flat vector back into its named ranges.
pub fn split<'a>(vector: &'a [f64], ranges: &'a [DimensionRange]) -> Result<Vec<(&'a str, &'a [f64])>> {
    let expected: usize = ranges.iter().map(|r| r.1).sum();
    if vector.len() != expected {
        return Err(MapSpaceError::DimensionMismatch {
            expected,
            got: vector.len(),
        });
    }

    let mut rest = vector;
    let mut out = Vec::with_capacity(ranges.len());
    for DimensionRange(name, dims) in ranges {
        let (head, tail) = rest.split_at(*dims);
        out.push((name.as_str(), head));
        rest = tail;
    }
    Ok(out)
}

/// Round every value to `digits` fractional digits.
pub fn round_vector(vector: &mut [f64], digits: i32) {
    let scale = 10f64.powi(digits);
    for v in vector.iter_mut() {
        *v = (*v * scale).round() / scale;
    }
}

pub fn pack_category(map: &VectorMap, category: Category) -> Result<Vec<f64>> {
    let extents = map.extents;
    // ordering happens in the same unit square the slot fields live in
    let center = extents.normalize(&extents.center());

    match Packer::for_category(category) {
        Packer::Ring { points } => {
            ring_fields(&map.outer_wall, points, &extents).map_err(within(category))
        }

        Packer::RingSlots { slots, points } => {
            let rings = match category {
                Category::Gates => &map.gates,
                _ => &map.islands,
            };
            let resampled = rings
                .iter()
                .map(|r| {
                    let centroid = extents.normalize(&r.centroid());
                    Ok((centroid, ring_fields(r, points, &extents)?))
                })
                .collect::<Result<Vec<_>>>()
                .map_err(within(category))?;

            SlotPacker::new(slots, vec![DEFAULT_FIELD; points * 2]).pack(
                &resampled,
                center,
                |(c, _)| *c,
                |(_, f)| f.clone(),
            )
        }

        Packer::PointSlots { slots, with_team } => {
            let elements = point_elements(map, category);
            let width = 2 + usize::from(with_team);
            SlotPacker::new(slots, vec![DEFAULT_FIELD; width]).pack(
                elements,
                center,
                |e| extents.normalize(&e.position),
                |e| point_fields(e, &extents, with_team),
            )
        }

        Packer::PrimaryFlag => {
            let flag = primary_flag(&map.flags)
                .ok_or_else(|| MapSpaceError::SelectionMismatch("no primary flag".into()))?;
            Ok(point_fields(flag, &extents, true))
        }
    }
}

/// Prefix geometry errors with the category they came from.
fn within(category: Category) -> impl Fn(MapSpaceError) -> MapSpaceError {
    move |e| match e {
        MapSpaceError::Geometry(msg) => MapSpaceError::Geometry(format!("{category}: {msg}")),
        other => other,
    }
}

fn point_elements(map: &VectorMap, category: Category) -> &[PointElement] {
    match category {
        Category::Boosts => &map.boosts,
        Category::Bombs => &map.bombs,
        Category::Spikes => &map.spikes,
        Category::Portals => &map.portals,
        Category::Powerups => &map.powerups,
        Category::Flags => &map.flags,
        Category::OuterWall | Category::Islands | Category::Gates => &[],
    }
}

fn point_fields(element: &PointElement, extents: &MapExtents, with_team: bool) -> Vec<f64> {
    let p = extents.normalize(&element.position);
    let mut fields = vec![p.x, p.y];
    if with_team {
        fields.push(element.team.encode());
    }
    fields
}

/// Resampled, normalized and flattened `(x, y)` pairs of a ring.
fn ring_fields(ring: &Ring, points: usize, extents: &MapExtents) -> Result<Vec<f64>> {
    Ok(resample(&ring.points, points)?
        .iter()
        .flat_map(|p| {
            let n = extents.normalize(p);
            [n.x, n.y]
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Point, Team};
    use approx::assert_relative_eq;

    fn square_map() -> VectorMap {
        let mut map = VectorMap::empty("square", 20.0, 10.0);
        map.outer_wall = Ring {
            points: vec![
                Point::new(0.0, 0.0),
                Point::new(20.0, 0.0),
                Point::new(20.0, 10.0),
                Point::new(0.0, 10.0),
            ],
            team: Team::None,
        };
        map.flags = vec![
            PointElement {
                position: Point::new(15.0, 5.0),
                team: Team::Blue,
            },
            PointElement {
                position: Point::new(5.0, 5.0),
                team: Team::Red,
            },
        ];
        map
    }

    #[test]
    fn test_describe_layouts() {
        assert_eq!(
            describe(Curation::Minimal),
            vec![
                DimensionRange("OUTER_WALL".into(), 100),
                DimensionRange("FLAGS".into(), 3),
            ]
        );
        assert_eq!(total_dimensions(Curation::Walls), 100);
        assert_eq!(
            total_dimensions(Curation::Extended),
            100 + 264 + 32 + 24 + 48 + 24 + 264 + 3 + 9
        );
    }

    #[test]
    fn test_curation_for_round_trips_describe() {
        for curation in Curation::ALL {
            assert_eq!(curation_for(&describe(curation)), Some(curation));
        }
        assert_eq!(curation_for(&[DimensionRange("FLAGS".into(), 3)]), None);
    }

    #[test]
    fn test_assemble_minimal_layout() {
        let map = square_map();
        let v = assemble(&map, Curation::Minimal).unwrap();
        assert_eq!(v.len(), 103);

        // wall starts at the first corner, normalized
        assert_relative_eq!(v[0], 0.0);
        assert_relative_eq!(v[1], 0.0);
        assert!(v[..100].iter().all(|x| (0.0..=1.0).contains(x)));

        // the red flag is primary: (5/20, 5/10, red)
        assert_relative_eq!(v[100], 0.25);
        assert_relative_eq!(v[101], 0.5);
        assert_relative_eq!(v[102], 0.0);
    }

    #[test]
    fn test_assemble_extended_with_empty_categories() {
        let mut map = square_map();
        map.boosts = vec![PointElement {
            position: Point::new(10.0, 5.0),
            team: Team::Blue,
        }];
        let v = assemble(&map, Curation::Extended).unwrap();
        assert_eq!(v.len(), total_dimensions(Curation::Extended));

        let ranges = describe(Curation::Extended);
        let parts = split(&v, &ranges).unwrap();
        let (name, islands) = parts[1];
        assert_eq!(name, "ISLANDS");
        // no islands: every slot is padding at the default position
        for slot in islands.chunks(33) {
            assert_eq!(slot[0], 0.0);
            assert!(slot[1..].iter().all(|&x| x == DEFAULT_FIELD));
        }

        let (name, boosts) = parts[2];
        assert_eq!(name, "BOOSTS");
        assert_eq!(&boosts[..4], &[1.0, 0.5, 0.5, 1.0]);
        assert_eq!(&boosts[4..8], &[0.0, 0.5, 0.5, 1.0]);
    }

    #[test]
    fn test_islands_ordered_by_centroid() {
        let mut map = square_map();
        let tri = |ox: f64| Ring {
            points: vec![
                Point::new(ox, 4.0),
                Point::new(ox + 2.0, 4.0),
                Point::new(ox + 1.0, 6.0),
            ],
            team: Team::None,
        };
        map.islands = vec![tri(1.0), tri(9.0)];

        let packed = pack_category(&map, Category::Islands).unwrap();
        assert_eq!(packed.len(), 264);
        // slot 0 is the island around x=10 (closest to center)
        assert_eq!(packed[0], 1.0);
        assert_relative_eq!(packed[1], 9.0 / 20.0);
        assert_eq!(packed[33], 1.0);
        assert_relative_eq!(packed[34], 1.0 / 20.0);
        assert_eq!(packed[66], 0.0);
    }

    #[test]
    fn test_slots_ordered_in_normalized_space_on_wide_map() {
        // 100×10: (50, 0) is nearer the raw center, (60, 5) the normalized one
        let mut map = VectorMap::empty("wide", 100.0, 10.0);
        map.boosts = vec![
            PointElement {
                position: Point::new(50.0, 0.0),
                team: Team::None,
            },
            PointElement {
                position: Point::new(60.0, 5.0),
                team: Team::None,
            },
        ];

        let packed = pack_category(&map, Category::Boosts).unwrap();
        let center = Point::new(0.5, 0.5);
        let existing: Vec<f64> = packed
            .chunks(4)
            .filter(|slot| slot[0] == 1.0)
            .map(|slot| Point::new(slot[1], slot[2]).distance(&center))
            .collect();
        assert_eq!(existing.len(), 2);
        assert!(existing[0] <= existing[1], "slots out of order: {packed:?}");

        assert_relative_eq!(packed[1], 0.6);
        assert_relative_eq!(packed[2], 0.5);
        assert_relative_eq!(packed[5], 0.5);
        assert_relative_eq!(packed[6], 0.0);
    }

    #[test]
    fn test_missing_outer_wall_is_geometry_error() {
        let mut map = square_map();
        map.outer_wall = Ring::default();
        assert!(matches!(
            assemble(&map, Curation::Walls),
            Err(MapSpaceError::Geometry(_))
        ));
    }

    #[test]
    fn test_split_rejects_wrong_length() {
        let ranges = describe(Curation::Walls);
        assert!(matches!(
            split(&[0.0; 7], &ranges),
            Err(MapSpaceError::DimensionMismatch {
                expected: 100,
                got: 7
            })
        ));
    }

    #[test]
    fn test_round_vector() {
        let mut v = vec![0.123456, 0.99999, 1.0 / 3.0];
        round_vector(&mut v, 4);
        assert_eq!(v, vec![0.1235, 1.0, 0.3333]);
    }
}
