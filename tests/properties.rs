use proptest::prelude::*;

use wirescene::sweep::{Dimension, DimensionTarget, GridPoint, Sweep, Unit, arithmetic_progression};

fn dimension(len: usize) -> Dimension {
    Dimension {
        path: format!("d{len}"),
        target: DimensionTarget::Engine {
            parameter: format!("d{len}"),
        },
        values: (0..len).map(|v| v as f64).collect(),
        unit: Unit::Linear,
    }
}

proptest! {
    #[test]
    fn progression_hits_both_endpoints(start in -1000i32..1000, step in 1i32..50, count in 0usize..200, descending in any::<bool>()) {
        let step = if descending { -step } else { step };
        let stop = start + step * count as i32;

        let values = arithmetic_progression(start as f64, step as f64, stop as f64).unwrap();
        prop_assert_eq!(values.len(), count + 1);
        prop_assert_eq!(values[0], start as f64);
        prop_assert_eq!(*values.last().unwrap(), stop as f64);
    }

    #[test]
    fn progression_never_overshoots(start in -100.0f64..100.0, step in 0.01f64..10.0, span in 0.0f64..500.0) {
        let stop = start + span;
        let values = arithmetic_progression(start, step, stop).unwrap();
        let last = *values.last().unwrap();

        prop_assert!(last <= stop + step * 1e-9);
        prop_assert!(stop - last < step * (1.0 + 1e-9));
        prop_assert!(values.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn progression_away_from_stop_is_rejected(start in -100.0f64..100.0, step in 0.01f64..10.0, span in 0.01f64..100.0) {
        prop_assert!(arithmetic_progression(start, -step, start + span).is_none());
    }

    #[test]
    fn grid_enumerates_every_combination(lens in prop::collection::vec(1usize..5, 0..4)) {
        let dimensions: Vec<Dimension> = lens.iter().map(|len| dimension(*len)).collect();
        let sweep = Sweep::new(&dimensions);
        let points: Vec<GridPoint> = sweep.iter().collect();

        prop_assert_eq!(points.len(), lens.iter().product::<usize>());
        let mut seen: Vec<Vec<usize>> = points.iter().map(|p| p.coordinates.clone()).collect();
        seen.sort();
        seen.dedup();
        prop_assert_eq!(seen.len(), points.len());
    }
}
