use cosfs_storage::management::StorageManagement;

pub struct AppState {
    pub management: StorageManagement,
    pub admin_token: Option<String>,
}
