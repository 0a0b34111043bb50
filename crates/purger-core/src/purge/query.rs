/// Filter describing which snapshots a purge command applies to.
///
/// Every constraint is optional and an unset constraint matches everything;
/// set constraints combine with AND. A set-valued constraint given as an
/// empty list matches nothing. Setting a field twice keeps the last value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotQuery {
    id: Option<i64>,
    resource_id: Option<i64>,
    root_project_id: Option<i64>,
    root_snapshot_id: Option<i64>,
    islast: Option<bool>,
    statuses: Option<Vec<String>>,
    scopes: Option<Vec<String>>,
    not_purged: bool,
}

impl SnapshotQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_resource_id(mut self, resource_id: i64) -> Self {
        self.resource_id = Some(resource_id);
        self
    }

    pub fn with_root_project_id(mut self, root_project_id: i64) -> Self {
        self.root_project_id = Some(root_project_id);
        self
    }

    pub fn with_root_snapshot_id(mut self, root_snapshot_id: i64) -> Self {
        self.root_snapshot_id = Some(root_snapshot_id);
        self
    }

    pub fn with_islast(mut self, islast: bool) -> Self {
        self.islast = Some(islast);
        self
    }

    pub fn with_statuses<I, S>(mut self, statuses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.statuses = Some(statuses.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = Some(scopes.into_iter().map(Into::into).collect());
        self
    }

    /// Only match snapshots that have not been soft-purged yet.
    pub fn with_not_purged(mut self, not_purged: bool) -> Self {
        self.not_purged = not_purged;
        self
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub fn resource_id(&self) -> Option<i64> {
        self.resource_id
    }

    pub fn root_project_id(&self) -> Option<i64> {
        self.root_project_id
    }

    pub fn root_snapshot_id(&self) -> Option<i64> {
        self.root_snapshot_id
    }

    pub fn islast(&self) -> Option<bool> {
        self.islast
    }

    pub fn statuses(&self) -> Option<&[String]> {
        self.statuses.as_deref()
    }

    pub fn scopes(&self) -> Option<&[String]> {
        self.scopes.as_deref()
    }

    pub fn not_purged(&self) -> bool {
        self.not_purged
    }

    /// True when no constraint is set, i.e. the query selects every snapshot.
    pub fn is_unbounded(&self) -> bool {
        *self == Self::default()
    }
}
