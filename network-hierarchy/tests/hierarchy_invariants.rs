use std::sync::Arc;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rust_decimal_macros::dec;
use uuid::Uuid;

use network_hierarchy::{
    HierarchyConfig, HierarchyError, HierarchyMutator, NodeMutation, SupplierForest, ValidationError,
};
use network_repository::{InMemoryStore, NodeRepository};
use network_shared::{NetworkNode, NewNode, NodeType, NodeUpdate};

fn mutator() -> (Arc<InMemoryStore>, HierarchyMutator) {
    let store = Arc::new(InMemoryStore::new());
    let mutator = HierarchyMutator::with_config(store.clone(), HierarchyConfig::no_retry());
    (store, mutator)
}

async fn stored(store: &InMemoryStore, id: Uuid) -> NetworkNode {
    store.get_node(&id).await.unwrap().unwrap()
}

async fn assert_consistent(store: &InMemoryStore) {
    let forest = SupplierForest::new(store.list_nodes().await.unwrap());
    let violations = forest.audit();
    assert!(violations.is_empty(), "invariants broken: {violations:?}");
}

#[tokio::test]
async fn chain_levels_follow_supplier_changes() {
    let (store, mutator) = mutator();

    let f = mutator.create_node(NewNode::new("F", NodeType::Factory)).await.unwrap();
    let r = mutator
        .create_node(NewNode::new("R", NodeType::Retail).with_supplier(f.id))
        .await
        .unwrap();
    let e = mutator
        .create_node(NewNode::new("E", NodeType::Entrepreneur).with_supplier(r.id))
        .await
        .unwrap();
    assert_eq!((f.level, r.level, e.level), (0, 1, 2));

    let f2 = mutator.create_node(NewNode::new("F2", NodeType::Factory)).await.unwrap();
    let summary = mutator.set_supplier(r.id, Some(f2.id)).await.unwrap();

    assert_eq!(summary.succeeded, vec![e.id]);
    assert_eq!(summary.changed, 0);
    assert_eq!(stored(&store, r.id).await.supplier_id, Some(f2.id));
    assert_eq!(stored(&store, r.id).await.level, 1);
    assert_eq!(stored(&store, e.id).await.level, 2);

    mutator.set_supplier(r.id, None).await.unwrap();
    assert_eq!(stored(&store, r.id).await.level, 0);
    assert_eq!(stored(&store, e.id).await.level, 1);

    assert_consistent(&store).await;
}

#[tokio::test]
async fn circular_assignment_leaves_store_untouched() {
    let (store, mutator) = mutator();
    let f = mutator.create_node(NewNode::new("F", NodeType::Factory)).await.unwrap();
    let r = mutator
        .create_node(NewNode::new("R", NodeType::Retail).with_supplier(f.id))
        .await
        .unwrap();
    let e = mutator
        .create_node(NewNode::new("E", NodeType::Entrepreneur).with_supplier(r.id))
        .await
        .unwrap();
    let before = store.snapshot().await;

    let err = mutator.set_supplier(r.id, Some(e.id)).await.unwrap_err();

    assert!(matches!(
        err,
        HierarchyError::Validation(ValidationError::CircularReference { .. })
    ));
    assert_eq!(store.snapshot().await, before);
}

#[tokio::test]
async fn factory_with_supplier_is_never_created() {
    let (store, mutator) = mutator();
    let f = mutator.create_node(NewNode::new("F", NodeType::Factory)).await.unwrap();

    let err = mutator
        .create_node(NewNode::new("F2", NodeType::Factory).with_supplier(f.id))
        .await
        .unwrap_err();

    assert!(err.is_rejection());
    assert_eq!(store.count_nodes().await.unwrap(), 1);
}

#[tokio::test]
async fn factory_cannot_take_a_supplier_later() {
    let (store, mutator) = mutator();
    let f = mutator.create_node(NewNode::new("F", NodeType::Factory)).await.unwrap();
    let r = mutator
        .create_node(NewNode::new("R", NodeType::Retail).with_supplier(f.id))
        .await
        .unwrap();
    let e = mutator
        .create_node(NewNode::new("E", NodeType::Entrepreneur).with_supplier(r.id))
        .await
        .unwrap();
    let before = store.snapshot().await;

    let err = mutator.set_supplier(f.id, Some(e.id)).await.unwrap_err();

    assert!(matches!(
        err,
        HierarchyError::Validation(ValidationError::FactoryWithSupplier)
    ));
    assert_eq!(store.snapshot().await, before);
    let f = stored(&store, f.id).await;
    assert_eq!(f.supplier_id, None);
    assert_eq!(f.level, 0);
    assert_eq!(stored(&store, e.id).await, e);
}

#[tokio::test]
async fn deleting_supplier_promotes_clients_to_roots() {
    let (store, mutator) = mutator();
    let f = mutator.create_node(NewNode::new("F", NodeType::Factory)).await.unwrap();
    let r = mutator
        .create_node(NewNode::new("R", NodeType::Retail).with_supplier(f.id))
        .await
        .unwrap();
    let e = mutator
        .create_node(NewNode::new("E", NodeType::Entrepreneur).with_supplier(r.id))
        .await
        .unwrap();

    mutator.delete_node(r.id).await.unwrap();

    let e = stored(&store, e.id).await;
    assert_eq!(e.supplier_id, None);
    assert_eq!(e.level, 0);
    assert_eq!(stored(&store, f.id).await.level, 0);
    assert_consistent(&store).await;
}

#[tokio::test]
async fn clearing_debt_does_not_touch_hierarchy() {
    let (store, mutator) = mutator();
    let f = mutator
        .create_node(NewNode::new("F", NodeType::Factory).with_debt(dec!(1500.50)))
        .await
        .unwrap();
    let r = mutator
        .create_node(
            NewNode::new("R", NodeType::Retail)
                .with_supplier(f.id)
                .with_debt(dec!(20.00)),
        )
        .await
        .unwrap();

    let cleared = {
        let _gate = mutator.write_guard().await;
        mutator.repository().clear_debt(&[f.id, r.id]).await.unwrap()
    };

    assert_eq!(cleared, 2);
    let r = stored(&store, r.id).await;
    assert_eq!(r.debt, dec!(0));
    assert_eq!(r.level, 1);
    assert_eq!(stored(&store, f.id).await.debt, dec!(0));
}

#[tokio::test]
async fn update_only_cascades_on_link_change() {
    let (store, mutator) = mutator();
    let f = mutator.create_node(NewNode::new("F", NodeType::Factory)).await.unwrap();
    let r = mutator.create_node(NewNode::new("R", NodeType::Retail)).await.unwrap();
    mutator
        .create_node(NewNode::new("E", NodeType::Entrepreneur).with_supplier(r.id))
        .await
        .unwrap();

    let NodeMutation { cascade, .. } = mutator
        .update_node(r.id, NodeUpdate::default().with_city("Berlin"))
        .await
        .unwrap();
    assert!(cascade.is_none());

    let NodeMutation { node, cascade } = mutator
        .update_node(r.id, NodeUpdate::supplier(Some(f.id)).with_name("R-moved"))
        .await
        .unwrap();
    assert_eq!(node.name, "R-moved");
    assert_eq!(node.level, 1);
    assert_eq!(cascade.map(|c| c.changed), Some(1));
    assert_consistent(&store).await;
}

/// Random sequences of legal and illegal operations never break the forest.
#[tokio::test]
async fn random_operations_preserve_invariants() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let (store, mutator) = mutator();
    let mut ids: Vec<Uuid> = Vec::new();

    for step in 0..300 {
        match rng.gen_range(0..10) {
            0..=3 => {
                let node_type = *NodeType::ALL.choose(&mut rng).unwrap_or(&NodeType::Retail);
                let mut new = NewNode::new(format!("node-{step}"), node_type);
                if node_type != NodeType::Factory && rng.gen_bool(0.7) {
                    if let Some(&supplier) = ids.choose(&mut rng) {
                        new = new.with_supplier(supplier);
                    }
                }
                let node = mutator.create_node(new).await.unwrap();
                ids.push(node.id);
            }
            4..=7 => {
                let (Some(&id), Some(&supplier)) = (ids.choose(&mut rng), ids.choose(&mut rng)) else {
                    continue;
                };
                let target = if rng.gen_bool(0.15) { None } else { Some(supplier) };
                match mutator.set_supplier(id, target).await {
                    Ok(summary) => assert!(summary.is_complete()),
                    Err(e) => assert!(e.is_rejection(), "unexpected failure: {e}"),
                }
            }
            _ => {
                if ids.is_empty() {
                    continue;
                }
                let id = ids.swap_remove(rng.gen_range(0..ids.len()));
                mutator.delete_node(id).await.unwrap();
            }
        }

        if step % 25 == 0 {
            assert_consistent(&store).await;
        }
    }

    assert_consistent(&store).await;
    assert_eq!(store.count_nodes().await.unwrap(), ids.len());
}
