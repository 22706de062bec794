//! Structural edits
//!
//! Every public operation checks all of its preconditions against the
//! current map before the first write, so a returned error leaves the model
//! untouched. The private helpers below assume those checks passed.

use tracing::{debug, trace};

use super::SchemaModel;
use crate::error::{Result, SchemaError};
use crate::node::{CombinationKind, FieldType, NodeKind, NodePosition, ObjectKind, UiSchemaNode};
use crate::pointer::{
    create_definition_pointer, create_property_pointer, escape_segment, extract_name_from_pointer,
    is_definition_pointer, is_same_or_descendant, replace_start, split_pointer_in_base_and_name,
    unescape_segment, Pointer, ROOT_POINTER,
};
use crate::wire::keywords::ARRAY_RESTRICTIONS;

/// Top-level renames performed by a batch of pointer changes, in order
type Renames = Vec<(Pointer, Pointer)>;

/// Names end up as pointer segments, which cannot be empty
fn check_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(SchemaError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Where `pointer` ended up after `renames` were applied
fn follow_renames(pointer: &Pointer, renames: &Renames) -> Pointer {
    let mut current = pointer.clone();
    for (old, new) in renames {
        if is_same_or_descendant(current.as_str(), old.as_str()) {
            current = Pointer::from(replace_start(current.as_str(), old.as_str(), new.as_str()));
        }
    }
    current
}

impl SchemaModel {
    // =========================================================================
    // Add
    // =========================================================================

    pub fn add_field(
        &mut self,
        name: Option<&str>,
        field_type: FieldType,
        target: NodePosition,
    ) -> Result<UiSchemaNode> {
        self.add_node(name, UiSchemaNode::field("", field_type), target)
    }

    pub fn add_combination(
        &mut self,
        name: Option<&str>,
        target: NodePosition,
        combination_type: CombinationKind,
    ) -> Result<UiSchemaNode> {
        self.add_node(name, UiSchemaNode::combination("", combination_type), target)
    }

    /// Add a reference to the definition named `definition_name`
    pub fn add_reference(
        &mut self,
        name: Option<&str>,
        definition_name: &str,
        target: NodePosition,
    ) -> Result<UiSchemaNode> {
        let reference = create_definition_pointer(definition_name);
        match self.get_node(reference.as_str()) {
            Ok(node) if node.is_definition() => {}
            _ => return Err(SchemaError::UnknownDefinition(definition_name.to_string())),
        }
        let parent = self.get_final_node(target.parent_pointer.as_str())?.pointer.clone();
        if self.will_result_in_circular_references(reference.as_str(), parent.as_str()) {
            debug!(reference = %reference, parent = %parent, "rejected reference: circular");
            return Err(SchemaError::CircularReference {
                child: reference.into_string(),
                parent: parent.into_string(),
            });
        }
        self.add_node(name, UiSchemaNode::reference("", reference), target)
    }

    /// Create an object definition under `$defs`
    pub fn add_field_type(&mut self, name: &str) -> Result<UiSchemaNode> {
        check_name(name)?;
        let pointer = create_definition_pointer(name);
        if self.has_node(pointer.as_str()) {
            return Err(SchemaError::DuplicatePointer(pointer.into_string()));
        }
        let root = self.get_root_node()?;
        if !root.is_valid_parent() {
            return Err(SchemaError::InvalidParent(ROOT_POINTER.to_string()));
        }

        debug!(pointer = %pointer, "adding definition");
        self.insert_child_pointer(ROOT_POINTER, pointer.clone(), None)?;
        let node = UiSchemaNode::field(pointer, FieldType::Object);
        self.nodes.set(node.clone());
        Ok(node)
    }

    fn add_node(
        &mut self,
        name: Option<&str>,
        mut node: UiSchemaNode,
        target: NodePosition,
    ) -> Result<UiSchemaNode> {
        let parent = self.get_final_node(target.parent_pointer.as_str())?.clone();
        if !parent.is_valid_parent() {
            return Err(SchemaError::InvalidParent(parent.pointer.into_string()));
        }

        let index = target.insertion_index(parent.children().len());
        let pointer = if parent.is_combination() {
            let name = Self::items_before(&parent, index).to_string();
            let pointer = create_property_pointer(&parent, &name)?;
            self.unshift_combination_children(&parent, index)?;
            node.is_combination_item = true;
            pointer
        } else {
            let name = name.ok_or(SchemaError::NameRequired)?;
            check_name(name)?;
            let pointer = create_property_pointer(&parent, name)?;
            if self.has_node(pointer.as_str()) {
                return Err(SchemaError::DuplicatePointer(pointer.into_string()));
            }
            pointer
        };

        debug!(pointer = %pointer, parent = %parent.pointer, index, "adding node");
        node.pointer = pointer.clone();
        node.implicit_type = false;
        self.insert_child_pointer(parent.pointer.as_str(), pointer, Some(index))?;
        self.nodes.set(node.clone());
        Ok(node)
    }

    // =========================================================================
    // Move
    // =========================================================================

    /// Move the node at `pointer` to `target`, returning it at its new place
    pub fn move_node(&mut self, pointer: &str, target: NodePosition) -> Result<UiSchemaNode> {
        let node = self.get_node(pointer)?.clone();
        if node.is_root() {
            return Err(SchemaError::RootNotAllowed("move"));
        }
        let old_parent = self.get_parent_node(pointer)?.clone();
        let new_parent = self.get_final_node(target.parent_pointer.as_str())?.clone();
        if !new_parent.is_valid_parent() {
            return Err(SchemaError::InvalidParent(new_parent.pointer.into_string()));
        }
        if is_same_or_descendant(new_parent.pointer.as_str(), pointer) {
            return Err(SchemaError::InvalidParent(new_parent.pointer.into_string()));
        }
        let changes_parent = old_parent.pointer != new_parent.pointer;
        if changes_parent && node.is_definition() && self.has_referring_nodes(pointer) {
            return Err(SchemaError::DefinitionInUse(pointer.to_string()));
        }
        if self.will_result_in_circular_references(pointer, new_parent.pointer.as_str()) {
            debug!(pointer, parent = %new_parent.pointer, "rejected move: circular");
            return Err(SchemaError::CircularReference {
                child: pointer.to_string(),
                parent: new_parent.pointer.into_string(),
            });
        }

        let moved = if !changes_parent {
            self.move_within_parent(&node.pointer, &new_parent, &target)?
        } else if new_parent.is_combination() {
            self.move_to_combination(&node.pointer, &old_parent, &new_parent, &target)?
        } else {
            self.move_to_object(&node.pointer, &old_parent, &new_parent, &target)?
        };
        self.get_node(moved.as_str()).cloned()
    }

    fn move_within_parent(
        &mut self,
        pointer: &Pointer,
        parent: &UiSchemaNode,
        target: &NodePosition,
    ) -> Result<Pointer> {
        let children = parent.children();
        let from = children
            .iter()
            .position(|child| child == pointer)
            .ok_or_else(|| SchemaError::ParentNotFound(pointer.to_string()))?;
        let to = target.insertion_index(children.len() - 1);

        debug!(pointer = %pointer, from, to, "reordering node");
        let reordered = move_array_item(children, from, to);
        let parent_node = self.nodes.get_mut(parent.pointer.as_str())?;
        if let Some(list) = parent_node.children_mut() {
            *list = reordered;
        }

        if parent.is_combination() {
            let renames = self.synchronize_combination_child_pointers(parent.pointer.as_str())?;
            return Ok(follow_renames(pointer, &renames));
        }
        Ok(pointer.clone())
    }

    fn move_to_object(
        &mut self,
        pointer: &Pointer,
        old_parent: &UiSchemaNode,
        new_parent: &UiSchemaNode,
        target: &NodePosition,
    ) -> Result<Pointer> {
        let name = extract_name_from_pointer(pointer.as_str());
        let new_pointer = create_property_pointer(new_parent, &name)?;
        if self.has_node(new_pointer.as_str()) {
            return Err(SchemaError::DuplicatePointer(new_pointer.into_string()));
        }

        debug!(from = %pointer, to = %new_pointer, "moving node to object");
        let index = target.insertion_index(new_parent.children().len());
        self.remove_child_pointer(old_parent.pointer.as_str(), pointer.as_str())?;
        self.insert_child_pointer(new_parent.pointer.as_str(), new_pointer.clone(), Some(index))?;
        self.change_pointer(pointer.as_str(), new_pointer.clone())?;
        self.nodes.get_mut(new_pointer.as_str())?.is_combination_item = false;

        self.settle_old_parent(old_parent, new_pointer)
    }

    fn move_to_combination(
        &mut self,
        pointer: &Pointer,
        old_parent: &UiSchemaNode,
        new_parent: &UiSchemaNode,
        target: &NodePosition,
    ) -> Result<Pointer> {
        let index = target.insertion_index(new_parent.children().len());
        let name = Self::items_before(new_parent, index).to_string();
        let new_pointer = create_property_pointer(new_parent, &name)?;

        debug!(from = %pointer, to = %new_pointer, "moving node to combination");
        // Making room may rename the subtree holding the moved node.
        let renames = self.unshift_combination_children(new_parent, index)?;
        let current = follow_renames(pointer, &renames);
        let old_parent_pointer = follow_renames(&old_parent.pointer, &renames);

        self.remove_child_pointer(old_parent_pointer.as_str(), current.as_str())?;
        self.insert_child_pointer(new_parent.pointer.as_str(), new_pointer.clone(), Some(index))?;
        self.change_pointer(current.as_str(), new_pointer.clone())?;
        self.nodes.get_mut(new_pointer.as_str())?.is_combination_item = true;

        let old_parent = self.get_node(old_parent_pointer.as_str())?.clone();
        self.settle_old_parent(&old_parent, new_pointer)
    }

    /// Renumber the previous parent if it was a combination
    fn settle_old_parent(&mut self, old_parent: &UiSchemaNode, moved: Pointer) -> Result<Pointer> {
        if !old_parent.is_combination() {
            return Ok(moved);
        }
        let renames = self.synchronize_combination_child_pointers(old_parent.pointer.as_str())?;
        Ok(follow_renames(&moved, &renames))
    }

    // =========================================================================
    // Update
    // =========================================================================

    /// Replace the data of the node at `pointer` with `new_node`.
    ///
    /// A different `new_node.pointer` renames the node. Children may be
    /// reordered but not added or removed.
    pub fn update_node(&mut self, pointer: &str, new_node: UiSchemaNode) -> Result<&mut Self> {
        let current = self.get_node(pointer)?.clone();
        self.check_update(&current, &new_node)?;

        debug!(pointer, new_pointer = %new_node.pointer, "updating node");
        let new_pointer = new_node.pointer.clone();
        let reordered_combination =
            current.is_combination() && current.children() != new_node.children();
        let mut data = new_node;
        data.pointer = current.pointer.clone();
        data.is_combination_item = current.is_combination_item;
        self.nodes.set(data);

        let mut final_pointer = current.pointer.clone();
        if new_pointer != current.pointer {
            self.change_pointer(pointer, new_pointer.clone())?;
            final_pointer = new_pointer;
        }
        if reordered_combination {
            self.synchronize_combination_child_pointers(final_pointer.as_str())?;
        }
        Ok(self)
    }

    fn check_update(&self, current: &UiSchemaNode, new_node: &UiSchemaNode) -> Result<()> {
        let pointer = current.pointer.as_str();
        let fail = |reason: &str| -> Result<()> { Err(SchemaError::invalid_update(pointer, reason)) };

        if new_node.pointer != current.pointer {
            if current.is_root() {
                return Err(SchemaError::RootNotAllowed("rename"));
            }
            let (old_base, _) = split_pointer_in_base_and_name(pointer);
            let (new_base, new_name) = split_pointer_in_base_and_name(new_node.pointer.as_str());
            if old_base != new_base {
                return fail("a rename must keep the parent and category");
            }
            if new_name.is_empty() || escape_segment(&unescape_segment(new_name)) != new_name {
                return Err(SchemaError::InvalidName(new_name.to_string()));
            }
            if self.is_child_of_combination(pointer) {
                return fail("combination items are named by their position");
            }
            if self.has_node(new_node.pointer.as_str()) {
                return Err(SchemaError::DuplicatePointer(new_node.pointer.to_string()));
            }
        }

        if current.is_root() && new_node.is_reference() {
            return Err(SchemaError::InvalidRoot);
        }

        let mut old_children = current.children().to_vec();
        let mut new_children = new_node.children().to_vec();
        old_children.sort();
        new_children.sort();
        if old_children != new_children {
            return fail("children may be reordered but not added or removed");
        }

        if !current.children().is_empty() {
            if current.object_kind() != new_node.object_kind() {
                return fail("a node with children cannot change its kind");
            }
            if current.combination_type() != new_node.combination_type() {
                return fail("use change_combination_type to change the combination kind");
            }
            if current.is_array != new_node.is_array {
                return fail("use toggle_is_array to change the array flag");
            }
            if new_node.object_kind() == ObjectKind::Field && !new_node.is_valid_parent() {
                return fail("only objects can hold properties");
            }
        }

        if let Some(target) = new_node.reference_target() {
            if !is_definition_pointer(target.as_str()) || !self.has_node(target.as_str()) {
                return Err(SchemaError::UnknownDefinition(
                    extract_name_from_pointer(target.as_str()).to_string(),
                ));
            }
            if current.reference_target() != Some(target) {
                let anchor = if current.is_definition() {
                    current.pointer.clone()
                } else {
                    self.get_parent_node(pointer)?.pointer.clone()
                };
                if self.will_result_in_circular_references(target.as_str(), anchor.as_str()) {
                    return Err(SchemaError::CircularReference {
                        child: target.to_string(),
                        parent: anchor.into_string(),
                    });
                }
            }
        }
        Ok(())
    }

    // =========================================================================
    // Delete
    // =========================================================================

    /// Delete the node and its whole subtree
    pub fn delete_node(&mut self, pointer: &str) -> Result<&mut Self> {
        if pointer == ROOT_POINTER {
            return Err(SchemaError::CannotDeleteRoot);
        }
        if self.is_definition_in_use(pointer)? {
            debug!(pointer, "rejected delete: definition in use");
            return Err(SchemaError::DefinitionInUse(pointer.to_string()));
        }
        let parent = self.get_parent_node(pointer)?.clone();

        let subtree = self.collect_subtree(pointer)?;
        debug!(pointer, count = subtree.len(), "deleting subtree");
        self.remove_child_pointer(parent.pointer.as_str(), pointer)?;
        for descendant in &subtree {
            self.nodes.delete(descendant.as_str());
        }
        if parent.is_combination() {
            self.synchronize_combination_child_pointers(parent.pointer.as_str())?;
        }
        Ok(self)
    }

    /// The node and all descendants, depth first
    fn collect_subtree(&self, pointer: &str) -> Result<Vec<Pointer>> {
        let mut out = Vec::new();
        let mut stack = vec![Pointer::from(pointer)];
        while let Some(current) = stack.pop() {
            let node = self.get_node(current.as_str())?;
            stack.extend(node.children().iter().rev().cloned());
            out.push(current);
        }
        Ok(out)
    }

    // =========================================================================
    // Convert and retype
    // =========================================================================

    /// Promote the subtree at `pointer` to a definition and put a reference
    /// to it in its place.
    pub fn convert_to_definition(&mut self, pointer: &str) -> Result<&mut Self> {
        let node = self.get_node(pointer)?.clone();
        if node.is_root() {
            return Err(SchemaError::RootNotAllowed("convert to definition"));
        }
        if node.is_reference() {
            return Err(SchemaError::AlreadyAReference(pointer.to_string()));
        }
        if node.is_definition() {
            return Err(SchemaError::AlreadyADefinition(pointer.to_string()));
        }
        let parent = self.get_parent_node(pointer)?.clone();
        let index = self.get_index_of_child_node(pointer)?;
        let root = self.get_root_node()?;
        if !root.is_valid_parent() {
            return Err(SchemaError::InvalidParent(ROOT_POINTER.to_string()));
        }

        let name = extract_name_from_pointer(pointer);
        let name = if self.has_definition(&name) {
            self.generate_unique_definition_name(&name)?
        } else {
            name.into_owned()
        };
        let definition = create_definition_pointer(&name);
        debug!(pointer, definition = %definition, "promoting node to definition");

        self.remove_child_pointer(parent.pointer.as_str(), pointer)?;
        self.insert_child_pointer(ROOT_POINTER, definition.clone(), None)?;
        self.change_pointer(pointer, definition.clone())?;
        if node.is_array {
            self.toggle_is_array(definition.as_str())?;
        }

        let mut reference = UiSchemaNode::reference(pointer, definition.clone());
        reference.is_array = node.is_array;
        reference.is_required = node.is_required;
        reference.is_combination_item = node.is_combination_item;

        let promoted = self.nodes.get_mut(definition.as_str())?;
        promoted.is_required = false;
        promoted.is_combination_item = false;
        if node.is_array {
            // The reference is the array now; item nillability moves into the definition.
            let mut items = node.items.clone().unwrap_or_default();
            reference.is_nillable = node.is_nillable;
            promoted.is_nillable = items.is_nillable;
            items.is_nillable = false;
            reference.items = Some(items).filter(|items| !items.is_empty());
            for key in ARRAY_RESTRICTIONS {
                if let Some(value) = promoted.restrictions.remove(*key) {
                    reference.restrictions.insert((*key).to_string(), value);
                }
            }
        }

        self.insert_child_pointer(parent.pointer.as_str(), reference.pointer.clone(), Some(index))?;
        self.nodes.set(reference);
        Ok(self)
    }

    pub fn change_combination_type(
        &mut self,
        pointer: &str,
        combination_type: CombinationKind,
    ) -> Result<&mut Self> {
        let node = self.nodes.get_mut(pointer)?;
        match &mut node.kind {
            NodeKind::Combination {
                combination_type: kind,
                ..
            } => *kind = combination_type,
            _ => return Err(SchemaError::NotACombination(pointer.to_string())),
        }
        debug!(pointer, kind = %combination_type, "changing combination type");
        self.update_child_pointers(pointer)?;
        Ok(self)
    }

    pub fn toggle_is_array(&mut self, pointer: &str) -> Result<&mut Self> {
        let node = self.nodes.get_mut(pointer)?;
        node.is_array = !node.is_array;
        if !node.is_array {
            node.items = None;
        }
        debug!(pointer, is_array = node.is_array, "toggling array");
        if node.is_valid_parent() {
            self.update_child_pointers(pointer)?;
        }
        Ok(self)
    }

    /// Recompute child pointers from the parent's current shape
    fn update_child_pointers(&mut self, pointer: &str) -> Result<()> {
        let node = self.get_node(pointer)?.clone();
        for child in node.children() {
            if is_definition_pointer(child.as_str()) {
                continue;
            }
            let new_pointer =
                create_property_pointer(&node, &extract_name_from_pointer(child.as_str()))?;
            self.change_pointer(child.as_str(), new_pointer)?;
        }
        Ok(())
    }

    // =========================================================================
    // Rewrite cascade
    // =========================================================================

    /// Move the node at `old` to `new`, fixing the parent link, referring
    /// nodes and every descendant pointer.
    pub(crate) fn change_pointer(&mut self, old: &str, new: Pointer) -> Result<()> {
        if old == new.as_str() {
            return Ok(());
        }
        trace!(old, new = %new, "rewriting pointer");

        if let Some(parent) = self.nodes.find_parent(old).map(|p| p.pointer.clone()) {
            if let Some(children) = self.nodes.get_mut(parent.as_str())?.children_mut() {
                for child in children.iter_mut().filter(|c| c.as_str() == old) {
                    *child = new.clone();
                }
            }
        }

        let referrers: Vec<Pointer> = self
            .nodes
            .referring_nodes(old)
            .iter()
            .map(|node| node.pointer.clone())
            .collect();
        for referrer in referrers {
            if let NodeKind::Reference { reference } = &mut self.nodes.get_mut(referrer.as_str())?.kind {
                *reference = new.clone();
            }
        }

        self.nodes.rekey(old, new.clone())?;

        let children = self.get_node(new.as_str())?.children().to_vec();
        for child in children {
            let child_new = replace_start(child.as_str(), old, new.as_str());
            self.change_pointer(child.as_str(), Pointer::from(child_new))?;
        }
        Ok(())
    }

    // =========================================================================
    // Children list helpers
    // =========================================================================

    fn insert_child_pointer(
        &mut self,
        parent: &str,
        pointer: Pointer,
        index: Option<usize>,
    ) -> Result<()> {
        let parent_node = self.nodes.get_mut(parent)?;
        if !parent_node.is_valid_parent() {
            return Err(SchemaError::InvalidParent(parent.to_string()));
        }
        if let Some(children) = parent_node.children_mut() {
            let at = index.filter(|i| *i <= children.len()).unwrap_or(children.len());
            children.insert(at, pointer);
        }
        Ok(())
    }

    fn remove_child_pointer(&mut self, parent: &str, pointer: &str) -> Result<()> {
        if let Some(children) = self.nodes.get_mut(parent)?.children_mut() {
            children.retain(|child| child.as_str() != pointer);
        }
        Ok(())
    }

    /// Number of positional items in front of `index` in a combination
    fn items_before(parent: &UiSchemaNode, index: usize) -> usize {
        parent
            .children()
            .iter()
            .take(index)
            .filter(|child| !is_definition_pointer(child.as_str()))
            .count()
    }

    /// Shift the names of combination items at or after `index` up by one,
    /// last first so no two items ever share a pointer.
    fn unshift_combination_children(&mut self, parent: &UiSchemaNode, index: usize) -> Result<Renames> {
        let first_shifted = Self::items_before(parent, index);
        let items = Self::combination_items(parent);
        let mut renames = Renames::new();
        for (ordinal, child) in items.iter().enumerate().rev() {
            if ordinal < first_shifted {
                break;
            }
            let new_pointer = create_property_pointer(parent, &(ordinal + 1).to_string())?;
            self.change_pointer(child.as_str(), new_pointer.clone())?;
            renames.push((child.clone(), new_pointer));
        }
        Ok(renames)
    }

    /// Rename combination items so their names equal their positions,
    /// going through temporary names to avoid collisions.
    fn synchronize_combination_child_pointers(&mut self, pointer: &str) -> Result<Renames> {
        let parent = self.get_node(pointer)?.clone();
        let items = Self::combination_items(&parent);
        let mut renames = Renames::new();
        let mut temporary = Vec::with_capacity(items.len());
        for (index, child) in items.iter().enumerate() {
            let tmp = create_property_pointer(&parent, &format!("tmp{}", index))?;
            self.change_pointer(child.as_str(), tmp.clone())?;
            renames.push((child.clone(), tmp.clone()));
            temporary.push(tmp);
        }

        for (index, tmp) in temporary.into_iter().enumerate() {
            let final_pointer = create_property_pointer(&parent, &index.to_string())?;
            self.change_pointer(tmp.as_str(), final_pointer.clone())?;
            renames.push((tmp, final_pointer));
        }
        Ok(renames)
    }
}

/// Move the element at `from` to `to`, shifting the elements in between
fn move_array_item<T: Clone>(items: &[T], from: usize, to: usize) -> Vec<T> {
    let mut out = items.to_vec();
    if from >= out.len() {
        return out;
    }
    let item = out.remove(from);
    let to = to.min(out.len());
    out.insert(to, item);
    out
}
