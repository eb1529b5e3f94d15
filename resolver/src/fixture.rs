//! Kernel model builder for unit tests.

use meld_core::{InstanceId, Value};
use meld_eval::{EvalContext, NativeTable};
use meld_graph::Graph;
use meld_mutation::MutationExecutor;
use meld_registry::Registry;

use crate::{kernel_registry, register_natives, Visibility};

pub(crate) struct Kernel {
    pub registry: Registry,
    pub graph: Graph,
    pub natives: NativeTable,
}

impl Kernel {
    pub fn new() -> Self {
        let mut natives = NativeTable::new();
        register_natives(&mut natives);
        Self {
            registry: kernel_registry().unwrap(),
            graph: Graph::new(),
            natives,
        }
    }

    pub fn ctx(&self) -> EvalContext<'_> {
        EvalContext::new(&self.registry, &self.graph, &self.natives)
    }

    fn exec(&mut self) -> MutationExecutor<'_, '_> {
        MutationExecutor::new(&self.registry, &mut self.graph)
    }

    fn link(&mut self, association: &str, source: InstanceId, target: InstanceId) {
        let association = self.registry.get_association_id(association).unwrap();
        self.exec().create_link(association, source, target).unwrap();
    }

    pub fn element(&mut self, class_name: &str, name: &str) -> InstanceId {
        let mut exec = self.exec();
        let id = exec.create_instance(class_name).unwrap();
        exec.set_attribute(id, "name", Value::from(name)).unwrap();
        id
    }

    /// Own `element` in `namespace` through a new membership.
    pub fn own(
        &mut self,
        namespace: InstanceId,
        element: InstanceId,
        visibility: Visibility,
    ) -> InstanceId {
        let membership = self.exec().create_instance("Membership").unwrap();
        self.exec()
            .set_attribute(membership, "visibility", visibility.into())
            .unwrap();
        self.link("NamespaceOwnedMembership", namespace, membership);
        self.link("MembershipMemberElement", membership, element);
        membership
    }

    /// A public feature owned by `owner`; returns (feature, membership).
    pub fn feature(&mut self, owner: InstanceId, name: &str) -> (InstanceId, InstanceId) {
        let feature = self.element("Feature", name);
        let membership = self.own(owner, feature, Visibility::Public);
        (feature, membership)
    }

    /// Relate `specific` to `general` with a Specialization-kind metaclass.
    pub fn relate(
        &mut self,
        metaclass: &str,
        specific: InstanceId,
        general: InstanceId,
    ) -> InstanceId {
        let relationship = self.exec().create_instance(metaclass).unwrap();
        self.link("TypeOwnedSpecialization", specific, relationship);
        self.link("SpecializationGeneral", relationship, general);
        relationship
    }

    pub fn specialize(&mut self, specific: InstanceId, general: InstanceId) -> InstanceId {
        self.relate("Specialization", specific, general)
    }

    pub fn conjugate(&mut self, ty: InstanceId, original: InstanceId) {
        let conjugation = self.exec().create_instance("Conjugation").unwrap();
        self.link("TypeOwnedConjugator", ty, conjugation);
        self.link("ConjugationOriginalType", conjugation, original);
    }

    pub fn import(&mut self, namespace: InstanceId, imported: InstanceId) -> InstanceId {
        let import = self.exec().create_instance("Import").unwrap();
        self.link("NamespaceOwnedImport", namespace, import);
        self.link("ImportImportedNamespace", import, imported);
        import
    }
}
