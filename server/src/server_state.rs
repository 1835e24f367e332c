use std::sync::Arc;

use navigation_data_management::DataManager;
use navigation_lib::gateway::MapsGateway;

pub struct ServerState {
    pub data_manager: DataManager,
    // Mapbox in production, a stub in tests.
    pub maps: Arc<dyn MapsGateway>,
}

impl ServerState {
    pub fn new(data_manager: DataManager, maps: Arc<dyn MapsGateway>) -> Self {
        Self {
            data_manager,
            maps,
        }
    }
}
