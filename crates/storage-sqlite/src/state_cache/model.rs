use diesel::prelude::*;

#[derive(Queryable, Identifiable, Insertable, AsChangeset, Selectable, Debug, Clone)]
#[diesel(primary_key(cache_key))]
#[diesel(table_name = crate::schema::app_state_cache)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AppStateCacheDB {
    pub cache_key: String,
    pub blob: String,
    pub updated_at: String,
}
