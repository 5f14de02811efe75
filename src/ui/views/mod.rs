mod entity_detail;
mod entity_list;
mod favorites;
mod home;

pub use entity_detail::EntityDetailView;
pub use entity_list::EntityListView;
pub use favorites::FavoritesView;
pub use home::HomeView;
