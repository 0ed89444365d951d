use rand::rngs::StdRng;
use rand::SeedableRng;
use scrolly_core::{
    builder::{BuildCtx, TimelineDef, TweenDef},
    config::Config,
    ease::{Curve, Direction, Ease},
    elements::ElementRegistry,
    geometry::{Rect, Size},
    pose::PoseCache,
    properties::{Property, RenderState},
    stagger::{StaggerConfig, StaggerMode},
    timeline::Timeline,
    tween::ValueFn,
};

fn approx(a: f32, b: f32, eps: f32) {
    assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
}

fn grid_layout() -> ElementRegistry {
    let mut reg = ElementRegistry::new();
    let rects: Vec<Rect> = (0..12)
        .map(|i| Rect::new((i % 4) as f32 * 250.0, (i / 4) as f32 * 260.0, 240.0, 250.0))
        .collect();
    reg.add_group("imgs", &rects);
    reg.add_group("title", &[Rect::new(200.0, 300.0, 600.0, 200.0)]);
    reg
}

fn build(def: &TimelineDef, reg: &ElementRegistry, seed: u64) -> Timeline {
    let config = Config {
        seed,
        ..Config::default()
    };
    let mut poses = PoseCache::new(Size::new(1000.0, 800.0));
    let mut rng = StdRng::seed_from_u64(config.seed);
    def.build(&mut BuildCtx {
        elements: reg,
        poses: &mut poses,
        rng: &mut rng,
        config: &config,
        scroll_origin: 0.0,
    })
    .expect("timeline builds")
    .timeline
}

/// Mirrors the 3D scatter grid: pose-derived start values, stagger from center.
fn scatter_def() -> TimelineDef {
    TimelineDef::new(Some("expo".parse().unwrap()))
        .push(
            TweenDef::from_to(
                "imgs",
                vec![
                    (Property::X, ValueFn::pose(), ValueFn::Const(0.0)),
                    (Property::Y, ValueFn::pose(), ValueFn::Const(0.0)),
                    (Property::Z, ValueFn::pose(), ValueFn::Const(0.0)),
                    (Property::RotateY, ValueFn::pose(), ValueFn::Const(0.0)),
                    (Property::Opacity, ValueFn::Const(0.0), ValueFn::Const(1.0)),
                    (Property::Scale, ValueFn::Const(0.7), ValueFn::Const(1.0)),
                ],
            )
            .stagger(StaggerConfig::amount(0.2, StaggerMode::FromCenter).with_grid(3, 4)),
        )
        .push(
            TweenDef::from(
                "imgs",
                vec![(
                    Property::Y,
                    ValueFn::Viewport {
                        axis: scrolly_core::tween::ViewportAxis::Height,
                        min_factor: 1.0,
                        max_factor: 1.8,
                    },
                )],
            )
            .duration(0.3)
            .at(0.0),
        )
}

fn to_def(ease: Ease) -> TimelineDef {
    TimelineDef::new(Some(ease))
        .push(
            TweenDef::to(
                "imgs",
                vec![
                    (Property::X, ValueFn::PerIndex(vec![10.0, -20.0, 30.0])),
                    (Property::RotateX, ValueFn::Const(45.0)),
                    (Property::Opacity, ValueFn::Const(0.0)),
                ],
            )
            .duration(1.0)
            .stagger(StaggerConfig::each(0.05)),
        )
        .push(
            TweenDef::to("title", vec![(Property::YPercent, ValueFn::Const(-80.0))])
                .duration(1.2)
                .at(0.4),
        )
}

#[test]
fn advance_is_deterministic() {
    let reg = grid_layout();
    let tl = build(&scatter_def(), &reg, 7);
    for i in 0..=20 {
        let p = i as f32 / 20.0;
        assert_eq!(tl.advance(p), tl.advance(p));
    }
}

#[test]
fn out_of_order_calls_match_fresh_calls() {
    let reg = grid_layout();
    let tl = build(&scatter_def(), &reg, 7);
    let forward: Vec<_> = (0..=10).map(|i| tl.advance(i as f32 / 10.0)).collect();
    for i in (0..=10).rev() {
        assert_eq!(tl.advance(i as f32 / 10.0), forward[i]);
    }
    tl.advance(0.93);
    assert_eq!(tl.advance(0.5), forward[5]);
}

#[test]
fn same_seed_same_timeline() {
    let reg = grid_layout();
    let a = build(&scatter_def(), &reg, 42);
    let b = build(&scatter_def(), &reg, 42);
    assert_eq!(a, b);
    let c = build(&scatter_def(), &reg, 43);
    assert_ne!(a.advance(0.0), c.advance(0.0));
}

#[test]
fn monotone_for_monotone_eases() {
    let reg = grid_layout();
    for ease in [
        Ease::LINEAR,
        Ease::out(Curve::Power(3)),
        Ease::new(Curve::Sine, Direction::InOut),
        Ease::new(Curve::Expo, Direction::In),
    ] {
        let tl = build(&to_def(ease), &reg, 0);
        let samples: Vec<_> = (0..=100).map(|i| tl.advance(i as f32 / 100.0)).collect();
        let (first, last) = (&samples[0], &samples[100]);
        for w in samples.windows(2) {
            for (k, ((_, a), (_, b))) in w[0].iter().zip(w[1].iter()).enumerate() {
                for prop in [Property::X, Property::RotateX, Property::YPercent, Property::Opacity] {
                    let rising = last.elements[k].1.get(prop) >= first.elements[k].1.get(prop);
                    let (va, vb) = (a.get(prop), b.get(prop));
                    if rising {
                        assert!(vb >= va - 1e-4, "{prop:?} decreased {va} -> {vb} ({ease})");
                    } else {
                        assert!(vb <= va + 1e-4, "{prop:?} increased {va} -> {vb} ({ease})");
                    }
                }
            }
        }
    }
}

#[test]
fn overshoot_eases_may_leave_the_range() {
    let reg = grid_layout();
    let tl = build(&to_def("back.out(2)".parse().unwrap()), &reg, 0);
    let peak = (0..=100)
        .map(|i| tl.advance(i as f32 / 100.0))
        .map(|s| s.elements[0].1.rotate_x)
        .fold(f32::NEG_INFINITY, f32::max);
    assert!(peak > 45.0);
    approx(tl.advance(1.0).elements[0].1.rotate_x, 45.0, 1e-4);
}

#[test]
fn reversibility_returns_to_baseline() {
    let reg = grid_layout();
    let tl = build(&to_def(Ease::out(Curve::Power(2))), &reg, 0);
    let start = tl.advance(0.0);
    assert!(start.iter().all(|(_, s)| s.is_baseline()));
    for p in [0.2, 0.6, 1.0] {
        let mid = tl.advance(p);
        assert!(mid.iter().any(|(_, s)| !s.is_baseline()));
        let back = tl.advance(0.0);
        assert_eq!(back, start);
        for (_, s) in back.iter() {
            assert_eq!(s.pose(), scrolly_core::pose::Pose::IDENTITY);
            assert_eq!(s.opacity, 1.0);
        }
    }
}

#[test]
fn from_tweens_end_at_baseline() {
    let reg = grid_layout();
    let tl = build(&scatter_def(), &reg, 3);
    let end = tl.advance(1.0);
    for (_, s) in end.iter() {
        assert_eq!(*s, RenderState::BASELINE);
    }
    // Corner images start displaced toward their own corner.
    let start = tl.advance(0.0);
    let first = start.elements[0].1;
    assert!(first.x < 0.0);
    assert_eq!(first.opacity, 0.0);
    assert_eq!(first.scale, 0.7);
}
