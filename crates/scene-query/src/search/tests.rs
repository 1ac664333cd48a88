use std::sync::Arc;
use std::time::Instant;

use serde_json::{json, Value};
use tokio::time::{sleep, Duration};

use super::*;
use crate::error::SceneQueryError;
use crate::storage::{Element, NodeId, RootKey, SceneNode, SceneTree};

fn scene(snapshot: Value) -> Arc<SharedScene> {
    let tree = SceneTree::from_json(snapshot).expect("snapshot");
    Arc::new(SharedScene::with_tree_mounted(tree))
}

fn finder(scene: &Arc<SharedScene>) -> SceneFinder<Arc<SharedScene>> {
    SceneFinder::new(Arc::clone(scene))
}

fn children_of(scene: &SharedScene, key: &str) -> Vec<NodeId> {
    scene
        .with_tree(|tree| {
            let root = tree.root(&RootKey::new(key)).expect("root");
            tree.children(root).to_vec()
        })
        .expect("tree")
}

fn panels() -> Value {
    let children = (0..5)
        .map(|index| {
            json!({
                "tag": "div",
                "identity": "panel",
                "key": format!("panel-{index}"),
                "element": { "handle": index + 1 },
            })
        })
        .collect::<Vec<_>>();
    json!({ "main": { "identity": "App", "children": children } })
}

// ---------------------------------------------------------------------------
// Synchronous finds
// ---------------------------------------------------------------------------

#[test]
fn index_picks_third_of_five_panels() {
    let scene = scene(panels());
    let panels = children_of(&scene, "main");
    let finder = finder(&scene);

    assert_eq!(finder.find_all("div.panel").unwrap(), panels);
    assert_eq!(finder.find_all("div.panel[2]").unwrap(), vec![panels[2]]);
    assert!(finder.find_all("div.panel[5]").unwrap().is_empty());
    assert!(finder.find_all("div.panel[-6]").unwrap().is_empty());
}

#[test]
fn last_is_negative_index() {
    let scene = scene(panels());
    let finder = finder(&scene);
    for (last, negative) in [("div[last()]", "div[-1]"), ("div[last()-1]", "div[-2]")] {
        assert_eq!(
            finder.find_all(last).unwrap(),
            finder.find_all(negative).unwrap()
        );
    }
    assert_eq!(
        finder.find_all("div[last()]").unwrap(),
        vec![children_of(&scene, "main")[4]]
    );
}

#[test]
fn strict_index_option_reports_out_of_range() {
    let scene = scene(panels());
    let finder = finder(&scene).with_options(FindOptions {
        strict_index: true,
        ..FindOptions::default()
    });
    let error = finder.find_all("div.panel[5]").unwrap_err();
    assert!(matches!(error, SceneQueryError::Search(_)));
}

#[test]
fn placeholder_equality_and_containment() {
    let scene = scene(json!({
        "main": { "tag": "form", "element": { "handle": 1 }, "children": [
            { "tag": "input", "element": { "handle": 2, "attributes": { "placeholder": "Name" } } },
            { "tag": "input", "element": { "handle": 3, "attributes": { "placeholder": "Nationality" } } },
            { "tag": "input", "element": { "handle": 4, "attributes": { "placeholder": "Email" } } }
        ] }
    }));
    let inputs = children_of(&scene, "main");
    let finder = finder(&scene);

    assert_eq!(
        finder.find_all("form/input[@placeholder=Name]").unwrap(),
        vec![inputs[0]]
    );
    assert_eq!(
        finder.find_all("form/input[@placeholder~Na]").unwrap(),
        vec![inputs[0], inputs[1]]
    );
    assert_eq!(
        finder.find_all("~input[@placeholder*=Na]AND[@placeholder^=ty]").unwrap(),
        vec![inputs[1]]
    );
}

#[test]
fn descendant_identity_with_exact_text() {
    let scene = scene(json!({
        "main": { "identity": "Shell", "children": [
            { "tag": "section", "identity": "id1", "element": { "handle": 1 }, "children": [
                { "tag": "div", "identity": "id2", "element": { "handle": 2 }, "children": [
                    { "text": "Messenger" }
                ] },
                { "tag": "div", "element": { "handle": 3 }, "children": [
                    { "tag": "div", "identity": "id2", "element": { "handle": 4 }, "children": [
                        { "text": "Messenger" }
                    ] }
                ] },
                { "tag": "div", "identity": "id2", "element": { "handle": 5 }, "children": [
                    { "text": "Messenger Lite" }
                ] }
            ] },
            { "tag": "div", "identity": "id2", "element": { "handle": 6 }, "children": [
                { "text": "Messenger" }
            ] }
        ] }
    }));
    let finder = finder(&scene);

    let matches = finder.find_all(".id1/~.id2[text=Messenger]").unwrap();
    let handles = scene
        .with_tree(|tree| {
            matches
                .iter()
                .map(|id| tree.get(*id).unwrap().element.as_ref().unwrap().handle.0)
                .collect::<Vec<_>>()
        })
        .unwrap();
    assert_eq!(handles, vec![2, 4]);

    assert_eq!(finder.find_all(".id1/~.id2[text~Messenger]").unwrap().len(), 3);
    assert_eq!(finder.find_all("~.id2[text=Messenger]").unwrap().len(), 3);
}

#[test]
fn text_matches_never_return_text_leaves() {
    let scene = scene(json!({
        "main": { "children": [
            { "tag": "button", "element": { "handle": 1 }, "children": [
                { "children": [ { "text": "Save" } ] }
            ] }
        ] }
    }));
    let finder = finder(&scene);
    let matches = finder.find_all("~*[text=Save]").unwrap();
    assert_eq!(matches.len(), 1);
    scene
        .with_tree(|tree| {
            let node = tree.get(matches[0]).unwrap();
            assert!(!node.is_text());
            assert!(node.has_element());
            assert_eq!(node.tag.as_deref(), Some("button"));
        })
        .unwrap();
}

#[test]
fn scopes_do_not_cross_contaminate() {
    let scene = scene(json!({
        "main": { "tag": "div", "element": { "handle": 1 }, "children": [
            { "tag": "button", "key": "save", "element": { "handle": 2 } }
        ] },
        "modal": { "tag": "div", "element": { "handle": 3 }, "children": [
            { "tag": "button", "key": "close", "element": { "handle": 4 } }
        ] }
    }));
    let finder = finder(&scene);
    let main_button = children_of(&scene, "main")[0];
    let modal_button = children_of(&scene, "modal")[0];

    assert_eq!(finder.find_all("~button").unwrap().len(), 2);
    assert_eq!(
        finder
            .find_all_in("~button", &Scope::Root(RootKey::new("modal")))
            .unwrap(),
        vec![modal_button]
    );
    assert_eq!(
        finder
            .find_all_in("~button", &Scope::Root(RootKey::new("main")))
            .unwrap(),
        vec![main_button]
    );
    assert!(finder
        .find_all_in("~button", &Scope::Root(RootKey::new("missing")))
        .unwrap()
        .is_empty());
    assert_eq!(
        finder
            .find_all_in("button", &Scope::Node(modal_button))
            .unwrap(),
        vec![modal_button]
    );
    assert!(finder
        .find_all_in("button/^div", &Scope::Node(modal_button))
        .unwrap()
        .is_empty());
}

#[test]
fn parse_errors_surface_synchronously() {
    let scene = scene(panels());
    let finder = finder(&scene);
    for expression in ["div[", "div[1]AND[text=a]", "li[:1]AND[:2]", "div+span", "li[a]OR[b]"] {
        let error = finder.find_all(expression).unwrap_err();
        assert!(
            matches!(error, SceneQueryError::Parse(_)),
            "{expression}: {error}"
        );
    }
}

#[test]
fn unmounted_host_is_not_ready_for_sync_calls() {
    let finder = SceneFinder::new(SharedScene::new());
    assert!(finder.find_all("div").unwrap_err().is_transient());
}

#[test]
fn element_policies() {
    let scene = scene(json!({
        "main": { "identity": "App", "children": [
            { "identity": "Card", "children": [
                { "tag": "article", "element": { "handle": 7 } }
            ] },
            { "identity": "Empty" }
        ] }
    }));
    let card_children = scene
        .with_tree(|tree| {
            let root = tree.root(&RootKey::new("main")).unwrap();
            tree.children(tree.children(root)[0]).to_vec()
        })
        .unwrap();
    let article = card_children[0];

    let logical = finder(&scene);
    assert_eq!(logical.find_all("~.Card").unwrap().len(), 1);
    assert_eq!(logical.find_element("~.Card").unwrap(), Some(article));
    assert_eq!(logical.find_element("~.Empty").unwrap(), None);

    let required = finder(&scene).with_options(FindOptions {
        element: ElementPolicy::RequireElement,
        ..FindOptions::default()
    });
    let error = required.find_all("~.Card").unwrap_err();
    assert!(error.to_string().contains("virtual node present"));
    assert_eq!(required.find_all("~article").unwrap(), vec![article]);

    let nearest = finder(&scene).with_options(FindOptions {
        element: ElementPolicy::NearestDescendant {
            tolerate_missing: false,
        },
        ..FindOptions::default()
    });
    assert_eq!(nearest.find_all("~.Card").unwrap(), vec![article]);
    assert!(matches!(
        nearest.find_all("~.Empty").unwrap_err(),
        SceneQueryError::Search(_)
    ));

    let tolerant = finder(&scene).with_options(FindOptions {
        element: ElementPolicy::NearestDescendant {
            tolerate_missing: true,
        },
        ..FindOptions::default()
    });
    assert!(tolerant.find_all("~.Empty").unwrap().is_empty());
}

#[test]
fn nearest_element_policy_collapses_shared_descendants() {
    let scene = scene(json!({
        "main": { "identity": "App", "children": [
            { "identity": "Wrap", "children": [
                { "identity": "Wrap", "children": [
                    { "tag": "article", "element": { "handle": 7 } }
                ] }
            ] }
        ] }
    }));
    let finder = finder(&scene).with_options(FindOptions {
        element: ElementPolicy::NearestDescendant {
            tolerate_missing: false,
        },
        ..FindOptions::default()
    });
    let logical = SceneFinder::new(Arc::clone(&scene));

    assert_eq!(logical.find_all("~.Wrap").unwrap().len(), 2);
    let resolved = finder.find_all("~.Wrap").unwrap();
    assert_eq!(resolved.len(), 1);
    assert_eq!(finder.find_all("~article").unwrap(), resolved);
}

#[test]
fn results_follow_host_root_order() {
    let scene = scene(json!({
        "zeta": { "tag": "button", "element": { "handle": 1 } },
        "alpha": { "tag": "button", "element": { "handle": 2 } }
    }));
    let matches = finder(&scene).find_all("button").unwrap();
    let handles = scene
        .with_tree(|tree| {
            matches
                .iter()
                .map(|id| tree.get(*id).unwrap().element.as_ref().unwrap().handle.0)
                .collect::<Vec<_>>()
        })
        .unwrap();
    assert_eq!(handles, vec![1, 2]);
}

#[test]
fn value_getters_read_the_first_match() {
    let scene = scene(json!({
        "main": {
            "identity": "App",
            "context": { "theme": "dark" },
            "children": [
                { "tag": "input", "key": "name",
                  "element": { "handle": 1, "attributes": { "placeholder": "Name" },
                               "properties": { "value": "Ada" } },
                  "data": { "required": true } },
                { "tag": "label", "element": { "handle": 2 }, "children": [
                    { "text": "Full " }, { "tag": "b", "element": { "handle": 3 }, "children": [
                        { "text": "name" }
                    ] }
                ] }
            ]
        }
    }));
    let finder = finder(&scene);

    assert_eq!(
        finder.attribute("input", "placeholder").unwrap(),
        Some(json!("Name"))
    );
    assert_eq!(finder.property("input", "value").unwrap(), Some(json!("Ada")));
    assert_eq!(finder.data("input", "required").unwrap(), Some(json!(true)));
    assert_eq!(finder.context("input", "theme").unwrap(), Some(json!("dark")));
    assert_eq!(finder.text("label").unwrap().as_deref(), Some("Full name"));
    assert_eq!(finder.attribute("select", "placeholder").unwrap(), None);
    assert!(finder.find_first("input#name").unwrap().is_some());
}

// ---------------------------------------------------------------------------
// Polled waits
// ---------------------------------------------------------------------------

fn spinner_scene() -> (Arc<SharedScene>, NodeId) {
    let mut tree = SceneTree::new();
    let app = tree.insert_root(RootKey::new("main"), SceneNode::new().with_identity("App"));
    let spinner = tree
        .insert_child(
            app,
            SceneNode::element("div", Element::new(1)).with_identity("spinner"),
        )
        .unwrap();
    (Arc::new(SharedScene::with_tree_mounted(tree)), spinner)
}

#[tokio::test]
async fn wait_until_absent_after_render_churn() {
    let (scene, spinner) = spinner_scene();
    let finder = finder(&scene);

    let churn = {
        let scene = Arc::clone(&scene);
        tokio::spawn(async move {
            for tick in 0..25u64 {
                scene
                    .commit(|tree| {
                        if let Some(node) = tree.get_mut(spinner) {
                            node.data.insert("tick".into(), json!(tick));
                        }
                    })
                    .unwrap();
                sleep(Duration::from_millis(20)).await;
            }
            scene.commit(|tree| tree.remove_subtree(spinner)).unwrap();
        })
    };

    let timeout = Duration::from_millis(2000);
    let outcome = finder
        .wait_until_absent("div.spinner", timeout)
        .await
        .expect("spinner should disappear");
    churn.await.unwrap();

    assert!(outcome.nodes.is_empty());
    assert!(outcome.elapsed < timeout);
    assert!(outcome.polls >= 2);
    assert!(finder.find_all("div.spinner").unwrap().is_empty());
}

#[tokio::test]
async fn wait_until_absent_times_out_when_node_stays() {
    let (scene, _) = spinner_scene();
    let finder = finder(&scene);
    let timeout = Duration::from_millis(2000);

    let started = Instant::now();
    let error = finder
        .wait_until_absent("div.spinner", timeout)
        .await
        .unwrap_err();

    assert!(started.elapsed() >= timeout);
    match error {
        SceneQueryError::Timeout {
            expression,
            elapsed,
        } => {
            assert_eq!(expression, "div.spinner");
            assert!(elapsed >= timeout);
        }
        other => panic!("expected timeout, got {other}"),
    }
}

#[tokio::test]
async fn find_within_resolves_on_the_first_quiet_tick() {
    let (scene, spinner) = spinner_scene();
    let finder = finder(&scene);
    let outcome = finder
        .find_within("div.spinner", Duration::from_millis(500))
        .await
        .unwrap();
    assert_eq!(outcome.nodes, vec![spinner]);
    assert_eq!(outcome.polls, 1);
    assert!(outcome.elapsed >= finder.settings().interval());
}

#[tokio::test]
async fn find_within_times_out_while_renders_keep_committing() {
    let (scene, spinner) = spinner_scene();
    let finder = finder(&scene);

    let churn = {
        let scene = Arc::clone(&scene);
        tokio::spawn(async move {
            for tick in 0..400u64 {
                scene
                    .commit(|tree| {
                        if let Some(node) = tree.get_mut(spinner) {
                            node.data.insert("tick".into(), json!(tick));
                        }
                    })
                    .unwrap();
                sleep(Duration::from_millis(5)).await;
            }
        })
    };
    sleep(Duration::from_millis(50)).await;

    let timeout = Duration::from_millis(300);
    let error = finder
        .find_within("div.spinner", timeout)
        .await
        .unwrap_err();
    churn.abort();

    match error {
        SceneQueryError::Timeout { elapsed, .. } => assert!(elapsed >= timeout),
        other => panic!("expected timeout, got {other}"),
    }
}

#[tokio::test]
async fn find_within_waits_for_a_late_node() {
    let scene = scene(json!({ "main": { "identity": "App" } }));
    let finder = finder(&scene).with_settings(PollSettings {
        interval_ms: 10,
        ..PollSettings::default()
    });

    let render = {
        let scene = Arc::clone(&scene);
        tokio::spawn(async move {
            sleep(Duration::from_millis(150)).await;
            scene
                .commit(|tree| {
                    let root = tree.root(&RootKey::new("main")).unwrap();
                    tree.insert_child(
                        root,
                        SceneNode::element("dialog", Element::new(9)).with_key("confirm"),
                    )
                    .unwrap()
                })
                .unwrap()
        })
    };

    let outcome = finder
        .find_within("dialog#confirm", Duration::from_millis(2000))
        .await
        .unwrap();
    let dialog = render.await.unwrap();
    assert_eq!(outcome.nodes, vec![dialog]);
    assert!(outcome.elapsed >= Duration::from_millis(100));
}

#[tokio::test]
async fn waits_ride_out_an_unmounted_host() {
    let scene = Arc::new(SharedScene::new());
    let finder = finder(&scene).with_settings(PollSettings {
        interval_ms: 10,
        ..PollSettings::default()
    });

    let mount = {
        let scene = Arc::clone(&scene);
        tokio::spawn(async move {
            sleep(Duration::from_millis(100)).await;
            let (source, _) = spinner_scene();
            let tree = source.unmount().unwrap();
            scene.mount(tree);
        })
    };

    let outcome = finder
        .find_within("div.spinner", Duration::from_millis(2000))
        .await
        .unwrap();
    mount.await.unwrap();
    assert_eq!(outcome.nodes.len(), 1);
}

#[tokio::test]
async fn host_not_ready_surfaces_after_the_deadline() {
    let finder = SceneFinder::new(SharedScene::new()).with_settings(PollSettings {
        interval_ms: 10,
        ..PollSettings::default()
    });
    let error = finder
        .find_within("div", Duration::from_millis(100))
        .await
        .unwrap_err();
    assert!(error.is_transient());
}

#[tokio::test]
async fn default_timeout_comes_from_settings() {
    let (scene, _) = spinner_scene();
    let finder = finder(&scene).with_settings(PollSettings {
        interval_ms: 10,
        default_timeout_ms: 150,
    });
    let error = finder.find_within_default("span").await.unwrap_err();
    assert!(error.is_timeout());
}

#[tokio::test]
async fn waits_fail_fast_on_parse_errors() {
    let (scene, _) = spinner_scene();
    let finder = finder(&scene);
    let started = Instant::now();
    let error = finder
        .find_within("div[text=a]OR[text=b]", Duration::from_secs(5))
        .await
        .unwrap_err();
    assert!(matches!(error, SceneQueryError::Parse(_)));
    assert!(started.elapsed() < Duration::from_secs(1));
}
