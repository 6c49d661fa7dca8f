//! Hierarchical resource builder: expands nested path definitions into nodes.

use tracing::{debug, instrument, trace};

use crate::domain::definition::{MethodDefinition, ResourceDefinition};
use crate::domain::error::DomainError;
use crate::domain::provisioner::ResourceProvisioner;

/// Result type for tree operations.
pub type TreeResult<T> = Result<T, DomainError>;

/// Resource tree rooted at a pre-existing node.
///
/// Holds the provisioner, the root and the inventory of every node created so
/// far, root first, then pre-order. `add_resources` grows the tree after the
/// initial build and appends to the same inventory.
pub struct HierarchicalResources<P: ResourceProvisioner> {
    provisioner: P,
    root: P::Node,
    resources: Vec<P::Node>,
}

impl<P: ResourceProvisioner> HierarchicalResources<P> {
    /// Attach `root_methods` to `root`, then expand `definitions` below it.
    ///
    /// The whole definition list is checked before the provisioner is
    /// touched, so an invalid path part leaves no partial tree behind.
    #[instrument(level = "debug", skip_all, fields(root = ?root))]
    pub fn build(
        mut provisioner: P,
        root: P::Node,
        root_methods: &[MethodDefinition],
        definitions: &[ResourceDefinition],
    ) -> TreeResult<Self> {
        validate_definitions(definitions, "resources")?;

        for method in root_methods {
            attach(&mut provisioner, root, method)?;
        }

        let mut resources = vec![root];
        resources.extend(expand_validated(&mut provisioner, root, definitions)?);
        debug!("built tree with {} resources", resources.len());

        Ok(Self {
            provisioner,
            root,
            resources,
        })
    }

    /// Expand `definitions` below `parent` and return the created nodes in
    /// pre-order, siblings left to right. `parent` itself is not included.
    #[instrument(level = "debug", skip(provisioner, definitions), fields(count = definitions.len()))]
    pub fn expand(
        provisioner: &mut P,
        parent: P::Node,
        definitions: &[ResourceDefinition],
    ) -> TreeResult<Vec<P::Node>> {
        validate_definitions(definitions, "resources")?;
        expand_validated(provisioner, parent, definitions)
    }

    /// Expand more definitions below the root and append them to the
    /// inventory.
    #[instrument(level = "debug", skip_all, fields(count = definitions.len()))]
    pub fn add_resources(&mut self, definitions: &[ResourceDefinition]) -> TreeResult<()> {
        let created = Self::expand(&mut self.provisioner, self.root, definitions)?;
        debug!("added {} resources", created.len());
        self.resources.extend(created);
        Ok(())
    }

    pub fn root(&self) -> P::Node {
        self.root
    }

    /// Every node created so far, root first.
    pub fn resources(&self) -> &[P::Node] {
        &self.resources
    }

    pub fn provisioner(&self) -> &P {
        &self.provisioner
    }

    pub fn into_provisioner(self) -> P {
        self.provisioner
    }
}

fn validate_definitions(definitions: &[ResourceDefinition], location: &str) -> TreeResult<()> {
    for (i, definition) in definitions.iter().enumerate() {
        let here = format!("{location}[{i}]");
        if definition.segments().is_empty() {
            return Err(DomainError::InvalidDefinition {
                path_part: definition.path_part.clone(),
                location: here,
            });
        }
        validate_definitions(&definition.children, &format!("{here}.children"))?;
    }
    Ok(())
}

fn expand_validated<P: ResourceProvisioner>(
    provisioner: &mut P,
    parent: P::Node,
    definitions: &[ResourceDefinition],
) -> TreeResult<Vec<P::Node>> {
    let mut created = Vec::new();

    for definition in definitions {
        let segments = definition.segments();
        // zero-segment definitions never get here, validate_definitions rejects them
        let Some((last, intermediate)) = segments.split_last() else {
            continue;
        };

        // "a/b/c": a and b are plain containers, only c is addressable
        let mut next_parent = parent;
        for segment in intermediate {
            let node = create(provisioner, next_parent, segment, definition)?;
            created.push(node);
            next_parent = node;
        }

        let node = provisioner
            .create_child(next_parent, last, definition.options.as_ref())
            .map_err(|e| {
                DomainError::provisioner(format!("create resource {last:?} under {next_parent:?}"), e)
            })?;
        trace!(?node, path_part = %definition.path_part, "created terminal resource");
        created.push(node);

        for method in &definition.methods {
            attach(provisioner, node, method)?;
        }

        if !definition.children.is_empty() {
            created.extend(expand_validated(provisioner, node, &definition.children)?);
        }
    }

    Ok(created)
}

fn create<P: ResourceProvisioner>(
    provisioner: &mut P,
    parent: P::Node,
    segment: &str,
    definition: &ResourceDefinition,
) -> TreeResult<P::Node> {
    let node = provisioner.create_child(parent, segment, None).map_err(|e| {
        DomainError::provisioner(
            format!("create resource {segment:?} of {:?} under {parent:?}", definition.path_part),
            e,
        )
    })?;
    trace!(?node, segment, "created intermediate resource");
    Ok(node)
}

fn attach<P: ResourceProvisioner>(
    provisioner: &mut P,
    node: P::Node,
    method: &MethodDefinition,
) -> TreeResult<()> {
    provisioner.attach_method(node, method).map_err(|e| {
        DomainError::provisioner(format!("attach {} to {node:?}", method.http_method), e)
    })
}
