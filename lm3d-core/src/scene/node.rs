use glam::Mat4;

/// One node of a model's transform tree. Children are owned, so the tree has no cycles.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ModelNode {
    pub name: String,
    pub transform: Mat4,
    pub mesh_indices: Vec<usize>,
    pub children: Vec<ModelNode>,
}

impl ModelNode {
    /// Creates a named node with the given local transform.
    pub fn new(name: impl Into<String>, transform: Mat4) -> Self {
        Self {
            name: name.into(),
            transform,
            mesh_indices: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Visits this node and its descendants depth-first, passing each node together with
    /// `parent * local` accumulated from `parent_transform` down to it.
    pub fn walk<F: FnMut(&ModelNode, Mat4)>(&self, parent_transform: Mat4, visit: &mut F) {
        let world = parent_transform * self.transform;
        visit(self, world);
        for child in &self.children {
            child.walk(world, visit);
        }
    }

    /// Total number of nodes in this subtree, including this one.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(ModelNode::node_count).sum::<usize>()
    }

    /// Finds the first node with the given name, depth-first.
    pub fn find(&self, name: &str) -> Option<&ModelNode> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(name))
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;

    #[test]
    fn walk_accumulates_transforms_depth_first() {
        let mut leaf = ModelNode::new("leaf", Mat4::from_scale(Vec3::splat(2.0)));
        leaf.mesh_indices.push(1);
        let mut arm = ModelNode::new("arm", Mat4::from_translation(Vec3::X));
        arm.children.push(leaf);
        let mut root = ModelNode::new("root", Mat4::IDENTITY);
        root.children.push(arm);
        root.children.push(ModelNode::new("other", Mat4::from_translation(Vec3::Y)));

        let mut visited = Vec::new();
        root.walk(Mat4::from_translation(Vec3::Z), &mut |node, world| {
            visited.push((node.name.clone(), world.transform_point3(Vec3::ONE)));
        });

        let names: Vec<&str> = visited.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["root", "arm", "leaf", "other"]);
        assert_eq!(visited[2].1, Vec3::new(3.0, 2.0, 3.0));
        assert_eq!(visited[3].1, Vec3::new(1.0, 2.0, 2.0));
        assert_eq!(root.node_count(), 4);
        assert_eq!(root.find("leaf").map(|n| n.mesh_indices.clone()), Some(vec![1]));
        assert!(root.find("missing").is_none());
    }
}
