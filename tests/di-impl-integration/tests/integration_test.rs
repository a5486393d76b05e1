//! 依赖注入实现的集成测试

use anyhow::Result;
use component_macros::Wireable;
use di_impl::{DependencyError, Scope, ScopeConfig, TagValue, WireTarget};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

trait Comp: Send + Sync {
    fn name(&self) -> &str;
}

/// 测试组件
#[derive(Debug, Wireable)]
struct Squash {
    name: String,
}

impl Comp for Squash {
    fn name(&self) -> &str {
        &self.name
    }
}

fn comp(name: &str) -> Squash {
    Squash {
        name: name.to_string(),
    }
}

fn register_comp(scope: &Scope, name: &str) -> Result<()> {
    scope.register(comp(name))?.implements::<dyn Comp>(|c| c);
    Ok(())
}

#[derive(Wireable, Default)]
struct Fan {
    #[inject]
    pub comp: Option<Arc<dyn Comp>>,
    pub other: &'static str,
}

#[derive(Wireable, Default)]
struct OptionalFan {
    #[inject(optional)]
    pub comp: Option<Arc<dyn Comp>>,
    #[inject(optional)]
    pub all: Vec<Arc<dyn Comp>>,
}

#[derive(Wireable, Default)]
struct Collector {
    #[inject("qualifier=*")]
    pub all: Vec<Arc<dyn Comp>>,
}

#[derive(Wireable, Default)]
struct QualifiedFan {
    #[inject(qualifier = "a")]
    pub comp: Option<Arc<dyn Comp>>,
}

fn names(comps: &[Arc<dyn Comp>]) -> Vec<&str> {
    comps.iter().map(|c| c.name()).collect()
}

fn wired_name(fan: &Fan) -> Option<&str> {
    fan.comp.as_ref().map(|c| c.name())
}

#[test]
fn test_single_unqualified_component() -> Result<()> {
    let scope = Scope::new();
    register_comp(&scope, "squash")?;

    let mut fan = Fan {
        other: "b",
        ..Default::default()
    };
    scope.wire(&mut fan)?;

    assert_eq!(wired_name(&fan), Some("squash"));
    assert_eq!(fan.other, "b");
    Ok(())
}

#[test]
fn test_wildcard_collection_puts_unqualified_first() -> Result<()> {
    let scope = Scope::new();
    scope
        .register(comp("soccer"))?
        .implements::<dyn Comp>(|c| c)
        .with_qualifier("soccer");
    register_comp(&scope, "squash")?;

    let mut collector = Collector::default();
    scope.wire(&mut collector)?;

    assert_eq!(names(&collector.all), vec!["squash", "soccer"]);
    Ok(())
}

#[test]
fn test_lowest_priority_wins() -> Result<()> {
    let scope = Scope::new();
    scope
        .register(comp("zero"))?
        .implements::<dyn Comp>(|c| c)
        .with_qualifier("a");
    scope
        .register(comp("minus one"))?
        .implements::<dyn Comp>(|c| c)
        .with_qualifier("a")
        .with_priority(-1);
    register_comp(&scope, "unqualified")?;

    let mut fan = QualifiedFan::default();
    scope.wire(&mut fan)?;

    assert_eq!(fan.comp.map(|c| c.name().to_string()), Some("minus one".to_string()));
    Ok(())
}

#[test]
fn test_child_inherits_from_parent() -> Result<()> {
    let parent = Arc::new(Scope::builder().name("parent").build());
    register_comp(&parent, "from parent")?;
    let child = Scope::child(&parent);

    let mut fan = Fan::default();
    child.wire(&mut fan)?;

    assert_eq!(wired_name(&fan), Some("from parent"));
    Ok(())
}

#[test]
fn test_factory_error_is_reported() -> Result<()> {
    let scope = Scope::new();
    scope
        .register_fallible(|| Err::<Squash, _>("factory exploded"))?
        .implements::<dyn Comp>(|c| c);

    let mut fan = Fan::default();
    let err = scope.wire(&mut fan).unwrap_err();

    let root = err.root_cause();
    match root {
        DependencyError::InstanceCreationFailed { component, .. } => {
            assert!(component.contains("Squash"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(
        std::error::Error::source(root).map(ToString::to_string),
        Some("factory exploded".to_string())
    );
    assert!(fan.comp.is_none());
    Ok(())
}

#[test]
fn test_resolve_returns_registered_value() -> Result<()> {
    let scope = Scope::new();
    scope
        .register(comp("q"))?
        .implements::<dyn Comp>(|c| c)
        .with_qualifier("q")
        .with_priority(3);
    scope
        .register(comp("other"))?
        .implements::<dyn Comp>(|c| c)
        .with_qualifier("other");

    let resolved = scope.resolve::<dyn Comp>(&TagValue::qualified("q"))?;

    assert_eq!(resolved.map(|c| c.name().to_string()), Some("q".to_string()));
    Ok(())
}

#[test]
fn test_optional_without_candidates() -> Result<()> {
    let scope = Scope::new();

    let mut fan = OptionalFan::default();
    scope.wire(&mut fan)?;

    assert!(fan.comp.is_none());
    assert!(fan.all.is_empty());
    Ok(())
}

#[test]
fn test_required_without_candidates() {
    let scope = Scope::new();
    scope.register(comp("not a comp")).unwrap();

    let mut fan = Fan::default();
    let err = scope.wire(&mut fan).unwrap_err();

    assert_eq!(err.field_path(), vec!["comp"]);
    assert!(matches!(
        err.root_cause(),
        DependencyError::NoCandidateFound { identifier } if identifier.contains("Comp")
    ));
}

#[test]
fn test_ambiguous_candidates() -> Result<()> {
    let scope = Scope::new();
    register_comp(&scope, "first")?;
    register_comp(&scope, "second")?;

    let mut fan = Fan::default();
    let err = scope.wire(&mut fan).unwrap_err();

    match err.root_cause() {
        DependencyError::AmbiguousCandidates {
            priority,
            candidates,
            ..
        } => {
            assert_eq!(*priority, 0);
            assert_eq!(candidates.len(), 2);
            assert!(candidates
                .iter()
                .all(|c| c.contains("registered at: ") && c.contains("integration_test.rs")));
        }
        other => panic!("unexpected error: {other}"),
    }
    Ok(())
}

#[test]
fn test_tie_across_scopes_is_ambiguous() -> Result<()> {
    let parent = Arc::new(Scope::new());
    register_comp(&parent, "parent")?;
    let child = Scope::child(&parent);
    register_comp(&child, "child")?;

    let err = child.wire(&mut Fan::default()).unwrap_err();
    assert!(matches!(
        err.root_cause(),
        DependencyError::AmbiguousCandidates { .. }
    ));

    let grandchild = Scope::child(&Arc::new(child));
    grandchild
        .register(comp("grandchild"))?
        .implements::<dyn Comp>(|c| c)
        .with_priority(-1);
    let mut fan = Fan::default();
    grandchild.wire(&mut fan)?;
    assert_eq!(wired_name(&fan), Some("grandchild"));
    Ok(())
}

#[test]
fn test_wildcard_collection_spans_scope_chain() -> Result<()> {
    let parent = Arc::new(Scope::new());
    parent
        .register(comp("parent low"))?
        .implements::<dyn Comp>(|c| c)
        .with_priority(-5);
    parent
        .register(comp("parent qualified"))?
        .implements::<dyn Comp>(|c| c)
        .with_qualifier("p");
    let child = Scope::child(&parent);
    child
        .register(comp("child qualified"))?
        .implements::<dyn Comp>(|c| c)
        .with_qualifier("c");
    register_comp(&child, "child")?;

    let mut collector = Collector::default();
    child.wire(&mut collector)?;

    assert_eq!(
        names(&collector.all),
        vec!["parent low", "child", "child qualified", "parent qualified"]
    );
    Ok(())
}

#[test]
fn test_instance_is_shared() -> Result<()> {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let scope = Scope::new();
    scope
        .register_factory(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            comp("shared")
        })?
        .implements::<dyn Comp>(|c| c);

    let mut first = Fan::default();
    let mut second = Fan::default();
    let mut collector = Collector::default();
    scope.wire_all(&mut [&mut first, &mut second, &mut collector])?;

    let first = first.comp.unwrap();
    assert!(Arc::ptr_eq(&first, &second.comp.unwrap()));
    assert!(Arc::ptr_eq(&first, &collector.all[0]));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(scope.stats().active_singletons, 1);
    Ok(())
}

#[test]
fn test_failed_factory_is_retried() -> Result<()> {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let scope = Scope::new();
    scope
        .register_fallible(move || {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err("not yet")
            } else {
                Ok(comp("ready"))
            }
        })?
        .implements::<dyn Comp>(|c| c);

    assert!(scope.wire(&mut Fan::default()).is_err());

    let mut fan = Fan::default();
    scope.wire(&mut fan)?;
    assert_eq!(wired_name(&fan), Some("ready"));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    Ok(())
}

#[test]
fn test_wire_all_stops_at_first_error() -> Result<()> {
    let scope = Scope::new();
    register_comp(&scope, "squash")?;

    let mut first = Fan::default();
    let mut failing = QualifiedFan::default();
    let mut last = Fan::default();
    let err = scope
        .wire_all(&mut [&mut first, &mut failing, &mut last])
        .unwrap_err();

    assert!(matches!(
        err.root_cause(),
        DependencyError::NoCandidateFound { identifier } if identifier.ends_with("with qualifier a")
    ));
    assert!(first.comp.is_some());
    assert!(last.comp.is_none());
    Ok(())
}

#[test]
#[should_panic(expected = "组件装配失败")]
fn test_must_wire_panics() {
    let scope = Scope::new();
    scope.must_wire(&mut Fan::default());
}

#[derive(Wireable)]
struct Hidden {
    #[inject]
    comp: Option<Arc<dyn Comp>>,
}

#[test]
#[should_panic(expected = "组件注册失败")]
fn test_must_register_panics_on_hidden_field() {
    let scope = Scope::new();
    scope.must_register(Hidden { comp: None });
}

#[test]
fn test_register_rejects_hidden_field() {
    let scope = Scope::new();

    let err = scope.register(Hidden { comp: None }).unwrap_err();
    assert!(matches!(err, DependencyError::InvalidComponentType { .. }));

    let err = scope.register_factory(|| Hidden { comp: None }).unwrap_err();
    assert!(matches!(err, DependencyError::InvalidResultType { .. }));

    let mut hidden = Hidden { comp: None };
    let err = scope.wire(&mut hidden).unwrap_err();
    assert!(matches!(err, DependencyError::FieldNotExported { .. }));
    assert!(hidden.comp.is_none());
    assert_eq!(scope.stats().registered_components, 0);
}

mod graph {
    //! 传递装配与循环依赖

    use super::*;
    use std::panic::{self, AssertUnwindSafe};

    #[derive(Wireable)]
    struct Coach {
        #[inject]
        pub comp: Option<Arc<dyn Comp>>,
    }

    #[derive(Wireable, Default)]
    struct Team {
        #[inject]
        pub coach: Option<Arc<Coach>>,
    }

    #[derive(Wireable)]
    struct Ping {
        #[inject]
        pub pong: Option<Arc<Pong>>,
    }

    #[derive(Wireable)]
    struct Pong {
        #[inject]
        pub ping: Option<Arc<Ping>>,
    }

    #[derive(Wireable, Default)]
    struct Table {
        #[inject]
        pub ping: Option<Arc<Ping>>,
    }

    #[derive(Wireable)]
    struct Narcissus {
        #[inject]
        pub me: Option<Arc<Narcissus>>,
    }

    #[derive(Wireable, Default)]
    struct Mirror {
        #[inject]
        pub narcissus: Option<Arc<Narcissus>>,
    }

    fn coach_comp(team: &Team) -> Option<&str> {
        team.coach
            .as_ref()
            .and_then(|coach| coach.comp.as_ref())
            .map(|c| c.name())
    }

    #[test]
    fn test_created_instances_are_wired_transitively() -> Result<()> {
        let scope = Scope::new();
        scope.register(Coach { comp: None })?;
        register_comp(&scope, "squash")?;

        let mut team = Team::default();
        scope.wire(&mut team)?;

        assert_eq!(coach_comp(&team), Some("squash"));
        Ok(())
    }

    #[test]
    fn test_value_survives_panicking_dependency() -> Result<()> {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let scope = Scope::new();
        scope.register(Coach { comp: None })?;
        scope
            .register_factory(move || {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    panic!("dependency factory blew up");
                }
                comp("recovered")
            })?
            .implements::<dyn Comp>(|c| c);

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            let mut team = Team::default();
            scope.wire(&mut team)
        }));
        assert!(outcome.is_err());

        let mut team = Team::default();
        scope.wire(&mut team)?;
        assert!(team.coach.is_some());

        let mut fan = Fan::default();
        scope.wire(&mut fan)?;
        assert_eq!(wired_name(&fan), Some("recovered"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        Ok(())
    }

    #[test]
    fn test_new_instance_is_wired_with_resolving_scope() -> Result<()> {
        let parent = Arc::new(Scope::new());
        parent.register(Coach { comp: None })?;
        let child = Scope::child(&parent);
        register_comp(&child, "child only")?;

        let mut team = Team::default();
        child.wire(&mut team)?;

        assert_eq!(coach_comp(&team), Some("child only"));
        Ok(())
    }

    #[test]
    fn test_cycle_is_detected() -> Result<()> {
        let scope = Scope::new();
        scope.register(Ping { pong: None })?;
        scope.register(Pong { ping: None })?;

        let err = scope.wire(&mut Table::default()).unwrap_err();

        match err.root_cause() {
            DependencyError::CyclicDependency { chain } => {
                assert_eq!(chain, "Ping -> Pong -> Ping");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(err.field_path(), vec!["ping", "pong", "ping"]);
        Ok(())
    }

    #[test]
    fn test_self_dependency_is_detected() -> Result<()> {
        let scope = Scope::new();
        scope.register(Narcissus { me: None })?;

        let err = scope.wire(&mut Mirror::default()).unwrap_err();

        assert!(matches!(
            err.root_cause(),
            DependencyError::CyclicDependency { .. }
        ));
        Ok(())
    }

    #[test]
    fn test_resolution_depth_is_bounded() -> Result<()> {
        let scope = Scope::builder()
            .config(ScopeConfig::new("shallow").with_max_resolution_depth(1))
            .build();
        scope.register(Coach { comp: None })?;
        register_comp(&scope, "squash")?;

        let err = scope.wire(&mut Team::default()).unwrap_err();

        assert!(matches!(
            err.root_cause(),
            DependencyError::ResolutionDepthExceeded { max_depth: 1, .. }
        ));
        assert_eq!(scope.name(), "shallow");
        Ok(())
    }

    #[test]
    fn test_wire_target_objects_can_be_mixed() -> Result<()> {
        let scope = Scope::new();
        scope.register(Coach { comp: None })?;
        register_comp(&scope, "squash")?;

        let mut team = Team::default();
        let mut fan = Fan::default();
        let mut targets: Vec<&mut dyn WireTarget> = vec![&mut team, &mut fan];
        scope.wire_all(&mut targets)?;

        assert_eq!(coach_comp(&team), Some("squash"));
        assert_eq!(wired_name(&fan), Some("squash"));
        Ok(())
    }
}
