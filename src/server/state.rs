use std::sync::Arc;

use crate::updater::Geolocator;

pub struct AppState {
    pub geolocator: Arc<Geolocator>,
}
