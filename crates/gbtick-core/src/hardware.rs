#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
/// DMG hardware revision.
///
/// Only the post-boot register contents differ between revisions in this
/// core; the revision is carried so the bootstrap presets match the part.
pub enum DmgRevision {
    Rev0,
    RevA,
    RevB,
    #[default]
    RevC,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// The console the core emulates.
pub enum Model {
    Dmg(DmgRevision),
    Cgb,
}

impl Model {
    #[inline]
    pub const fn is_cgb(self) -> bool {
        matches!(self, Model::Cgb)
    }
}

impl Default for Model {
    fn default() -> Self {
        Model::Dmg(DmgRevision::default())
    }
}
