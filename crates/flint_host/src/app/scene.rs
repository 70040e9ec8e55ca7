use std::collections::BTreeMap;

use thiserror::Error;
use tracing::debug;

use super::math::{Vec3, Vec4};
use super::node::{GeometryError, Listeners, NodeDesc, Transform};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SceneError {
    #[error("unknown scene node {0:?}")]
    UnknownNode(NodeId),
    #[error("node {child:?} already belongs to parent {parent:?}")]
    AlreadyParented { child: NodeId, parent: NodeId },
    #[error("adding {child:?} under {parent:?} would create a cycle")]
    Cycle { parent: NodeId, child: NodeId },
    #[error("invalid geometry for node '{name}': {source}")]
    InvalidGeometry {
        name: String,
        #[source]
        source: GeometryError,
    },
}

/// Scene-graph surface the application mutates.
///
/// Membership toggles are idempotent: `Ok(false)` means the call changed
/// nothing (attach of an attached root, detach of an absent node).
pub trait SceneCollaborator {
    fn create_node(&mut self, desc: &NodeDesc) -> Result<NodeId, SceneError>;
    fn destroy_node(&mut self, node: NodeId) -> Result<(), SceneError>;
    fn attach(&mut self, node: NodeId) -> Result<bool, SceneError>;
    fn detach(&mut self, node: NodeId) -> Result<bool, SceneError>;
    fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<bool, SceneError>;
    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<bool, SceneError>;
    fn set_position(&mut self, node: NodeId, position: Vec3) -> Result<(), SceneError>;
    fn set_text_color(&mut self, node: NodeId, color: Vec4) -> Result<(), SceneError>;
    fn is_attached(&self, node: NodeId) -> bool;
}

#[derive(Debug, Default)]
pub struct NodeIdAllocator {
    next: u64,
}

impl NodeIdAllocator {
    pub fn allocate(&mut self) -> NodeId {
        let id = NodeId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

#[derive(Debug, Clone)]
pub struct SceneNode {
    id: NodeId,
    desc: NodeDesc,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl SceneNode {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.desc.name.as_deref()
    }

    pub fn desc(&self) -> &NodeDesc {
        &self.desc
    }

    pub fn transform(&self) -> &Transform {
        &self.desc.transform
    }

    pub fn position(&self) -> Vec3 {
        self.desc.transform.position
    }

    pub fn text_color(&self) -> Option<Vec4> {
        self.desc.text.as_ref().map(|text| text.color)
    }

    pub fn listeners(&self) -> Listeners {
        self.desc.listeners
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// In-memory scene graph. Ids are never reused, so a destroyed node's id
/// stays unknown for the rest of the graph's life.
#[derive(Debug, Default)]
pub struct SceneGraph {
    allocator: NodeIdAllocator,
    nodes: BTreeMap<NodeId, SceneNode>,
    roots: Vec<NodeId>,
}

impl SceneGraph {
    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(&id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .values()
            .find(|node| node.name() == Some(name))
            .map(SceneNode::id)
    }

    pub fn listeners(&self, id: NodeId) -> Listeners {
        self.node(id).map(SceneNode::listeners).unwrap_or_default()
    }

    /// Attached nodes registered for frame ticks, depth-first in attach order.
    pub fn frame_listeners(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let Some(node) = self.node(id) else {
                continue;
            };
            if node.desc.listeners.frame {
                out.push(id);
            }
            stack.extend(node.children.iter().rev().copied());
        }
        out
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut SceneNode, SceneError> {
        self.nodes.get_mut(&id).ok_or(SceneError::UnknownNode(id))
    }

    fn ensure_exists(&self, id: NodeId) -> Result<&SceneNode, SceneError> {
        self.node(id).ok_or(SceneError::UnknownNode(id))
    }

    fn validate_tree(desc: &NodeDesc) -> Result<(), SceneError> {
        if let Some(geometry) = &desc.geometry {
            geometry
                .validate()
                .map_err(|source| SceneError::InvalidGeometry {
                    name: desc.name.clone().unwrap_or_else(|| "<unnamed>".to_string()),
                    source,
                })?;
        }
        desc.children.iter().try_for_each(Self::validate_tree)
    }

    fn instantiate(&mut self, desc: &NodeDesc, parent: Option<NodeId>) -> NodeId {
        let id = self.allocator.allocate();
        let mut own = desc.clone();
        own.children.clear();
        let children = desc
            .children
            .iter()
            .map(|child_desc| self.instantiate(child_desc, Some(id)))
            .collect();
        self.nodes.insert(
            id,
            SceneNode {
                id,
                desc: own,
                parent,
                children,
            },
        );
        id
    }

    fn is_ancestor(&self, ancestor: NodeId, mut node: NodeId) -> bool {
        // Parent links never form cycles, but bound the walk anyway.
        for _ in 0..=self.nodes.len() {
            if node == ancestor {
                return true;
            }
            match self.node(node).and_then(SceneNode::parent) {
                Some(parent) => node = parent,
                None => return false,
            }
        }
        false
    }

    fn unlink_from_parent(&mut self, child: NodeId) {
        let Some(parent) = self.node(child).and_then(SceneNode::parent) else {
            return;
        };
        if let Some(parent_node) = self.nodes.get_mut(&parent) {
            parent_node.children.retain(|id| *id != child);
        }
        if let Some(child_node) = self.nodes.get_mut(&child) {
            child_node.parent = None;
        }
    }
}

impl SceneCollaborator for SceneGraph {
    fn create_node(&mut self, desc: &NodeDesc) -> Result<NodeId, SceneError> {
        Self::validate_tree(desc)?;
        Ok(self.instantiate(desc, None))
    }

    fn destroy_node(&mut self, node: NodeId) -> Result<(), SceneError> {
        self.ensure_exists(node)?;
        self.unlink_from_parent(node);
        self.roots.retain(|id| *id != node);
        let mut pending = vec![node];
        let mut destroyed = 0usize;
        while let Some(id) = pending.pop() {
            if let Some(removed) = self.nodes.remove(&id) {
                pending.extend(removed.children);
                destroyed += 1;
            }
        }
        debug!(node = node.0, destroyed, "scene_node_destroyed");
        Ok(())
    }

    fn attach(&mut self, node: NodeId) -> Result<bool, SceneError> {
        let existing_parent = self.ensure_exists(node)?.parent;
        if self.roots.contains(&node) {
            return Ok(false);
        }
        if let Some(parent) = existing_parent {
            return Err(SceneError::AlreadyParented {
                child: node,
                parent,
            });
        }
        self.roots.push(node);
        debug!(node = node.0, root_count = self.roots.len(), "scene_node_attached");
        Ok(true)
    }

    fn detach(&mut self, node: NodeId) -> Result<bool, SceneError> {
        let parent = self.ensure_exists(node)?.parent;
        if let Some(index) = self.roots.iter().position(|id| *id == node) {
            self.roots.remove(index);
            debug!(node = node.0, root_count = self.roots.len(), "scene_node_detached");
            return Ok(true);
        }
        // Nested nodes are removed from whichever attached parent holds them.
        match parent {
            Some(parent) if self.is_attached(parent) => {
                self.unlink_from_parent(node);
                debug!(node = node.0, parent = parent.0, "scene_child_detached");
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<bool, SceneError> {
        self.ensure_exists(parent)?;
        match self.ensure_exists(child)?.parent {
            Some(current) if current == parent => return Ok(false),
            Some(current) => {
                return Err(SceneError::AlreadyParented {
                    child,
                    parent: current,
                })
            }
            None => {}
        }
        if self.is_ancestor(child, parent) {
            return Err(SceneError::Cycle { parent, child });
        }
        self.roots.retain(|id| *id != child);
        self.node_mut(child)?.parent = Some(parent);
        self.node_mut(parent)?.children.push(child);
        Ok(true)
    }

    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<bool, SceneError> {
        self.ensure_exists(parent)?;
        if self.ensure_exists(child)?.parent != Some(parent) {
            return Ok(false);
        }
        self.unlink_from_parent(child);
        Ok(true)
    }

    fn set_position(&mut self, node: NodeId, position: Vec3) -> Result<(), SceneError> {
        self.node_mut(node)?.desc.transform.position = position;
        Ok(())
    }

    fn set_text_color(&mut self, node: NodeId, color: Vec4) -> Result<(), SceneError> {
        if let Some(text) = self.node_mut(node)?.desc.text.as_mut() {
            text.color = color;
        }
        Ok(())
    }

    fn is_attached(&self, node: NodeId) -> bool {
        let mut current = node;
        for _ in 0..=self.nodes.len() {
            match self.node(current) {
                None => return false,
                Some(found) => match found.parent {
                    Some(parent) => current = parent,
                    None => return self.roots.contains(&current),
                },
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::node::{GeometryDesc, TextDesc, VertexChannel};

    fn frame_node(name: &str) -> NodeDesc {
        NodeDesc::named(name).with_listeners(Listeners {
            frame: true,
            ..Listeners::default()
        })
    }

    #[test]
    fn allocator_never_reuses_ids() {
        let mut allocator = NodeIdAllocator::default();
        assert_eq!(allocator.allocate(), NodeId(0));
        assert_eq!(allocator.allocate(), NodeId(1));
        assert_eq!(allocator.allocate(), NodeId(2));
    }

    #[test]
    fn attach_and_detach_are_idempotent() {
        let mut scene = SceneGraph::default();
        let node = scene.create_node(&NodeDesc::named("menu")).expect("node");

        assert!(!scene.is_attached(node));
        assert_eq!(scene.attach(node), Ok(true));
        assert_eq!(scene.attach(node), Ok(false));
        assert_eq!(scene.roots(), &[node]);
        assert!(scene.is_attached(node));

        assert_eq!(scene.detach(node), Ok(true));
        assert_eq!(scene.detach(node), Ok(false));
        assert!(scene.roots().is_empty());
        assert!(!scene.is_attached(node));
    }

    #[test]
    fn unknown_node_is_reported() {
        let mut scene = SceneGraph::default();
        assert_eq!(
            scene.attach(NodeId(42)),
            Err(SceneError::UnknownNode(NodeId(42)))
        );
        assert_eq!(
            scene.set_position(NodeId(3), Vec3::ZERO),
            Err(SceneError::UnknownNode(NodeId(3)))
        );
    }

    #[test]
    fn create_node_instantiates_children_recursively() {
        let mut scene = SceneGraph::default();
        let root = scene
            .create_node(
                &NodeDesc::named("root")
                    .with_child(NodeDesc::named("a").with_child(NodeDesc::named("a1")))
                    .with_child(NodeDesc::named("b")),
            )
            .expect("tree");

        assert_eq!(scene.node_count(), 4);
        let a = scene.find_by_name("a").expect("a");
        let a1 = scene.find_by_name("a1").expect("a1");
        let b = scene.find_by_name("b").expect("b");
        assert_eq!(scene.node(root).expect("root").children(), &[a, b]);
        assert_eq!(scene.node(a1).expect("a1").parent(), Some(a));
        assert!(scene.node(root).expect("root").desc().children.is_empty());

        scene.attach(root).expect("attach");
        assert!(scene.is_attached(a1));
    }

    #[test]
    fn invalid_geometry_anywhere_in_tree_creates_nothing() {
        let mut scene = SceneGraph::default();
        let broken = NodeDesc::named("broken").with_geometry(GeometryDesc {
            layout: vec![VertexChannel::Position],
            vertices: vec![0.0, 0.0, 0.0],
            indices: vec![1],
        });
        let result = scene.create_node(&NodeDesc::named("root").with_child(broken));

        assert!(matches!(
            result,
            Err(SceneError::InvalidGeometry { ref name, .. }) if name == "broken"
        ));
        assert_eq!(scene.node_count(), 0);
    }

    #[test]
    fn detach_removes_nested_node_from_attached_parent() {
        let mut scene = SceneGraph::default();
        let game = scene.create_node(&NodeDesc::named("game")).expect("game");
        let enemy = scene.create_node(&NodeDesc::named("enemy")).expect("enemy");
        scene.attach(game).expect("attach");
        assert_eq!(scene.add_child(game, enemy), Ok(true));
        assert!(scene.is_attached(enemy));

        assert_eq!(scene.detach(enemy), Ok(true));
        assert!(scene.node(game).expect("game").children().is_empty());
        assert_eq!(scene.node(enemy).expect("enemy").parent(), None);
        assert!(!scene.is_attached(enemy));
    }

    #[test]
    fn detach_of_child_under_detached_parent_is_a_no_op() {
        let mut scene = SceneGraph::default();
        let game = scene.create_node(&NodeDesc::named("game")).expect("game");
        let enemy = scene.create_node(&NodeDesc::named("enemy")).expect("enemy");
        scene.add_child(game, enemy).expect("add child");

        assert_eq!(scene.detach(enemy), Ok(false));
        assert_eq!(scene.node(enemy).expect("enemy").parent(), Some(game));
    }

    #[test]
    fn children_follow_parent_attachment() {
        let mut scene = SceneGraph::default();
        let game = scene.create_node(&NodeDesc::named("game")).expect("game");
        let enemy = scene.create_node(&NodeDesc::named("enemy")).expect("enemy");
        scene.add_child(game, enemy).expect("add child");

        assert!(!scene.is_attached(enemy));
        scene.attach(game).expect("attach");
        assert!(scene.is_attached(enemy));
        scene.detach(game).expect("detach");
        assert!(!scene.is_attached(enemy));
        assert_eq!(scene.node(enemy).expect("enemy").parent(), Some(game));
    }

    #[test]
    fn add_child_rejects_cycles_and_second_parent() {
        let mut scene = SceneGraph::default();
        let a = scene.create_node(&NodeDesc::named("a")).expect("a");
        let b = scene.create_node(&NodeDesc::named("b")).expect("b");
        let c = scene.create_node(&NodeDesc::named("c")).expect("c");

        assert_eq!(scene.add_child(a, b), Ok(true));
        assert_eq!(scene.add_child(a, b), Ok(false));
        assert_eq!(
            scene.add_child(b, a),
            Err(SceneError::Cycle {
                parent: b,
                child: a
            })
        );
        assert_eq!(
            scene.add_child(a, a),
            Err(SceneError::Cycle {
                parent: a,
                child: a
            })
        );
        assert_eq!(
            scene.add_child(c, b),
            Err(SceneError::AlreadyParented {
                child: b,
                parent: a
            })
        );
        assert_eq!(
            scene.attach(b),
            Err(SceneError::AlreadyParented {
                child: b,
                parent: a
            })
        );
    }

    #[test]
    fn add_child_moves_attached_root_under_parent() {
        let mut scene = SceneGraph::default();
        let game = scene.create_node(&NodeDesc::named("game")).expect("game");
        let loose = scene.create_node(&NodeDesc::named("loose")).expect("loose");
        scene.attach(loose).expect("attach");

        scene.add_child(game, loose).expect("add child");
        assert!(scene.roots().is_empty());
        assert_eq!(scene.remove_child(game, loose), Ok(true));
        assert_eq!(scene.remove_child(game, loose), Ok(false));
    }

    #[test]
    fn frame_listeners_walk_attached_tree_in_order() {
        let mut scene = SceneGraph::default();
        let first = scene
            .create_node(&frame_node("first").with_child(frame_node("first_child")))
            .expect("first");
        let silent = scene
            .create_node(&NodeDesc::named("silent").with_child(frame_node("nested")))
            .expect("silent");
        let detached = scene.create_node(&frame_node("detached")).expect("detached");
        scene.attach(first).expect("attach first");
        scene.attach(silent).expect("attach silent");

        let names: Vec<&str> = scene
            .frame_listeners()
            .into_iter()
            .filter_map(|id| scene.node(id).and_then(SceneNode::name))
            .collect();
        assert_eq!(names, vec!["first", "first_child", "nested"]);
        assert!(!scene.frame_listeners().contains(&detached));
    }

    #[test]
    fn set_text_color_only_touches_text_nodes() {
        let mut scene = SceneGraph::default();
        let label = scene
            .create_node(&NodeDesc::named("label").with_text(TextDesc {
                value: "Start Game".to_string(),
                color: Vec4::new(0.1, 0.1, 0.1, 1.0),
                size: 12.0,
            }))
            .expect("label");
        let plain = scene.create_node(&NodeDesc::named("plain")).expect("plain");

        scene
            .set_text_color(label, Vec4::new(1.0, 0.1, 0.1, 1.0))
            .expect("label color");
        scene
            .set_text_color(plain, Vec4::new(1.0, 0.1, 0.1, 1.0))
            .expect("plain color");

        assert_eq!(
            scene.node(label).expect("label").text_color(),
            Some(Vec4::new(1.0, 0.1, 0.1, 1.0))
        );
        assert_eq!(scene.node(plain).expect("plain").text_color(), None);
    }

    #[test]
    fn destroy_node_frees_the_whole_subtree() {
        let mut scene = SceneGraph::default();
        let game = scene.create_node(&NodeDesc::named("game")).expect("game");
        let enemy = scene
            .create_node(&NodeDesc::named("enemy").with_child(NodeDesc::named("turret")))
            .expect("enemy");
        let turret = scene.find_by_name("turret").expect("turret");
        scene.attach(game).expect("attach");
        scene.add_child(game, enemy).expect("add child");
        assert_eq!(scene.node_count(), 3);

        scene.destroy_node(enemy).expect("destroy");
        assert_eq!(scene.node_count(), 1);
        assert!(scene.node(game).expect("game").children().is_empty());
        assert!(scene.node(turret).is_none());
        assert!(!scene.is_attached(enemy));
        assert_eq!(scene.find_by_name("enemy"), None);
        assert_eq!(
            scene.destroy_node(enemy),
            Err(SceneError::UnknownNode(enemy))
        );
    }

    #[test]
    fn destroying_a_root_detaches_it() {
        let mut scene = SceneGraph::default();
        let menu = scene.create_node(&NodeDesc::named("menu")).expect("menu");
        scene.attach(menu).expect("attach");

        scene.destroy_node(menu).expect("destroy");
        assert!(scene.roots().is_empty());
        assert_eq!(scene.node_count(), 0);
        assert_eq!(
            scene.create_node(&NodeDesc::named("next")).expect("next"),
            NodeId(1)
        );
    }
}
