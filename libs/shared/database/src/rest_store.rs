use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use shared_config::AppConfig;
use shared_models::appointment::Appointment;
use shared_models::clinic::{Client, Veterinarian};
use shared_models::pet::{MedicalRecord, Pet, PetQrCode};
use shared_models::shop::{Order, OrderItem, OrderStatus, PaymentStatus, Product, ProductFilters};

use crate::repository::{
    AppointmentQuery, AppointmentRepository, MedicalRecordRepository, OrderQuery,
    OrderRepository, PetRepository, ProductRepository, ProfileRepository, QrCodeRepository,
    RepoResult, RepositoryError, Store,
};
use crate::supabase::{ApiStatusError, SupabaseClient};

/// PostgREST-backed storage. Row-level rules live in the API, so every call
/// runs with the service key.
pub struct SupabaseStore {
    supabase: SupabaseClient,
}

impl SupabaseStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub fn from_client(supabase: SupabaseClient) -> Self {
        Self { supabase }
    }

    async fn select<T: DeserializeOwned>(&self, entity: &str, path: &str) -> RepoResult<Vec<T>> {
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, path, None)
            .await
            .map_err(|e| map_api_error(entity, e))?;
        decode_rows(rows)
    }

    async fn select_one<T: DeserializeOwned>(&self, entity: &str, path: &str) -> RepoResult<T> {
        self.select::<T>(entity, path)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RepositoryError::NotFound(entity.to_string()))
    }

    async fn write<T, B>(&self, entity: &str, method: Method, path: &str, body: &B) -> RepoResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_value(body)
            .map_err(|e| RepositoryError::Backend(format!("Failed to encode {}: {}", entity, e)))?;
        let rows: Vec<Value> = self
            .supabase
            .request_with_headers(
                method,
                path,
                Some(body),
                Some(SupabaseClient::representation_headers()),
            )
            .await
            .map_err(|e| map_api_error(entity, e))?;
        decode_rows::<T>(rows)?
            .into_iter()
            .next()
            .ok_or_else(|| RepositoryError::NotFound(entity.to_string()))
    }

    async fn delete(&self, entity: &str, path: &str) -> RepoResult<()> {
        let rows: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::DELETE,
                path,
                None,
                Some(SupabaseClient::representation_headers()),
            )
            .await
            .map_err(|e| map_api_error(entity, e))?;
        if rows.is_empty() {
            return Err(RepositoryError::NotFound(entity.to_string()));
        }
        Ok(())
    }

    async fn rpc<T: DeserializeOwned>(&self, entity: &str, function: &str, args: Value) -> RepoResult<T> {
        let path = format!("/rest/v1/rpc/{}", function);
        let value: Value = self
            .supabase
            .request(Method::POST, &path, Some(args))
            .await
            .map_err(|e| map_api_error(entity, e))?;
        serde_json::from_value(value)
            .map_err(|e| RepositoryError::Backend(format!("Failed to decode {}: {}", entity, e)))
    }
}

fn decode_rows<T: DeserializeOwned>(rows: Vec<Value>) -> RepoResult<Vec<T>> {
    rows.into_iter()
        .map(serde_json::from_value)
        .collect::<Result<Vec<T>, _>>()
        .map_err(|e| RepositoryError::Backend(format!("Failed to decode row: {}", e)))
}

fn encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

fn timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Translates PostgREST failures into repository errors: unique violations are
/// conflicts, exceptions raised by our SQL functions are rejections.
fn map_api_error(entity: &str, err: anyhow::Error) -> RepositoryError {
    match err.downcast_ref::<ApiStatusError>() {
        Some(api) => match (api.status, api.code().as_deref()) {
            (404, _) => RepositoryError::NotFound(entity.to_string()),
            (409, _) | (_, Some("23505")) => {
                warn!("Uniqueness violation writing {}: {}", entity, api.message());
                RepositoryError::Conflict(conflict_message(entity))
            }
            (_, Some("P0001")) => RepositoryError::Rejected(api.message()),
            _ => RepositoryError::Backend(err.to_string()),
        },
        None => RepositoryError::Backend(err.to_string()),
    }
}

fn conflict_message(entity: &str) -> String {
    if entity == "Appointment" {
        "Selected time is not available".to_string()
    } else {
        format!("{} already exists", entity)
    }
}

#[async_trait]
impl ProfileRepository for SupabaseStore {
    async fn get_client(&self, id: &str) -> RepoResult<Client> {
        self.select_one("Client", &format!("/rest/v1/clients?id=eq.{}", encode(id)))
            .await
    }

    async fn get_veterinarian(&self, id: &str) -> RepoResult<Veterinarian> {
        self.select_one(
            "Veterinarian",
            &format!("/rest/v1/veterinarians?id=eq.{}", encode(id)),
        )
        .await
    }

    async fn list_clients(&self) -> RepoResult<Vec<Client>> {
        self.select("Client", "/rest/v1/clients?order=id.asc").await
    }

    async fn list_veterinarians(&self) -> RepoResult<Vec<Veterinarian>> {
        self.select("Veterinarian", "/rest/v1/veterinarians?order=id.asc")
            .await
    }

    async fn create_client(&self, client: &Client) -> RepoResult<Client> {
        self.write("Client", Method::POST, "/rest/v1/clients", client)
            .await
    }

    async fn create_veterinarian(&self, vet: &Veterinarian) -> RepoResult<Veterinarian> {
        self.write("Veterinarian", Method::POST, "/rest/v1/veterinarians", vet)
            .await
    }

    async fn update_client(&self, client: &Client) -> RepoResult<Client> {
        let path = format!("/rest/v1/clients?id=eq.{}", encode(&client.id));
        self.write("Client", Method::PATCH, &path, client).await
    }

    async fn update_veterinarian(&self, vet: &Veterinarian) -> RepoResult<Veterinarian> {
        let path = format!("/rest/v1/veterinarians?id=eq.{}", encode(&vet.id));
        self.write("Veterinarian", Method::PATCH, &path, vet).await
    }

    async fn delete_profile(&self, id: &str) -> RepoResult<()> {
        let client_path = format!("/rest/v1/clients?id=eq.{}", encode(id));
        match self.delete("User", &client_path).await {
            Err(RepositoryError::NotFound(_)) => {
                let vet_path = format!("/rest/v1/veterinarians?id=eq.{}", encode(id));
                self.delete("User", &vet_path).await
            }
            other => other,
        }
    }
}

#[async_trait]
impl PetRepository for SupabaseStore {
    async fn get_pet(&self, id: &str) -> RepoResult<Pet> {
        self.select_one("Pet", &format!("/rest/v1/pets?id=eq.{}", encode(id)))
            .await
    }

    async fn list_pets_by_owner(&self, owner_id: &str) -> RepoResult<Vec<Pet>> {
        let path = format!(
            "/rest/v1/pets?owner_id=eq.{}&order=created_at.asc",
            encode(owner_id)
        );
        self.select("Pet", &path).await
    }

    async fn create_pet(&self, pet: &Pet) -> RepoResult<Pet> {
        self.write("Pet", Method::POST, "/rest/v1/pets", pet).await
    }

    async fn update_pet(&self, pet: &Pet) -> RepoResult<Pet> {
        let path = format!("/rest/v1/pets?id=eq.{}", encode(&pet.id));
        self.write("Pet", Method::PATCH, &path, pet).await
    }

    async fn delete_pet(&self, id: &str) -> RepoResult<()> {
        self.delete("Pet", &format!("/rest/v1/pets?id=eq.{}", encode(id)))
            .await
    }
}

#[async_trait]
impl MedicalRecordRepository for SupabaseStore {
    async fn get_medical_record(&self, id: &str) -> RepoResult<MedicalRecord> {
        self.select_one(
            "Medical record",
            &format!("/rest/v1/medical_records?id=eq.{}", encode(id)),
        )
        .await
    }

    async fn list_medical_records(&self, pet_id: &str) -> RepoResult<Vec<MedicalRecord>> {
        let path = format!(
            "/rest/v1/medical_records?pet_id=eq.{}&order=date_of_visit.desc",
            encode(pet_id)
        );
        self.select("Medical record", &path).await
    }

    async fn create_medical_record(&self, record: &MedicalRecord) -> RepoResult<MedicalRecord> {
        self.write(
            "Medical record",
            Method::POST,
            "/rest/v1/medical_records",
            record,
        )
        .await
    }

    async fn update_medical_record(&self, record: &MedicalRecord) -> RepoResult<MedicalRecord> {
        let path = format!("/rest/v1/medical_records?id=eq.{}", encode(&record.id));
        self.write("Medical record", Method::PATCH, &path, record)
            .await
    }

    async fn delete_medical_record(&self, id: &str) -> RepoResult<()> {
        self.delete(
            "Medical record",
            &format!("/rest/v1/medical_records?id=eq.{}", encode(id)),
        )
        .await
    }
}

#[async_trait]
impl QrCodeRepository for SupabaseStore {
    async fn get_qr_code_by_pet(&self, pet_id: &str) -> RepoResult<PetQrCode> {
        self.select_one(
            "QR code",
            &format!("/rest/v1/qr_codes?pet_id=eq.{}", encode(pet_id)),
        )
        .await
    }

    async fn get_active_qr_code_by_public_url(&self, public_url: &str) -> RepoResult<PetQrCode> {
        let path = format!(
            "/rest/v1/qr_codes?public_url=eq.{}&is_active=eq.true",
            encode(public_url)
        );
        self.select_one("QR code", &path).await
    }

    async fn create_qr_code(&self, qr_code: &PetQrCode) -> RepoResult<PetQrCode> {
        self.write("QR code", Method::POST, "/rest/v1/qr_codes", qr_code)
            .await
    }

    async fn update_qr_code(&self, qr_code: &PetQrCode) -> RepoResult<PetQrCode> {
        let path = format!("/rest/v1/qr_codes?id=eq.{}", encode(&qr_code.id));
        self.write("QR code", Method::PATCH, &path, qr_code).await
    }
}

#[async_trait]
impl AppointmentRepository for SupabaseStore {
    async fn get_appointment(&self, id: &str) -> RepoResult<Appointment> {
        self.select_one(
            "Appointment",
            &format!("/rest/v1/appointments?id=eq.{}", encode(id)),
        )
        .await
    }

    async fn list_appointments(&self, query: &AppointmentQuery) -> RepoResult<Vec<Appointment>> {
        let mut path = "/rest/v1/appointments?order=appointment_date.asc".to_string();
        if let Some(client_id) = &query.client_id {
            path.push_str(&format!("&client_id=eq.{}", encode(client_id)));
        }
        if let Some(vet_id) = &query.veterinarian_id {
            path.push_str(&format!("&veterinarian_id=eq.{}", encode(vet_id)));
        }
        self.select("Appointment", &path).await
    }

    async fn list_veterinarian_appointments_between(
        &self,
        veterinarian_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> RepoResult<Vec<Appointment>> {
        debug!(
            "Fetching appointments for veterinarian {} in [{}, {})",
            veterinarian_id, from, to
        );
        let path = format!(
            "/rest/v1/appointments?veterinarian_id=eq.{}&appointment_date=gte.{}&appointment_date=lt.{}&order=appointment_date.asc",
            encode(veterinarian_id),
            encode(&timestamp(from)),
            encode(&timestamp(to)),
        );
        self.select("Appointment", &path).await
    }

    async fn create_appointment(&self, appointment: &Appointment) -> RepoResult<Appointment> {
        self.write(
            "Appointment",
            Method::POST,
            "/rest/v1/appointments",
            appointment,
        )
        .await
    }

    async fn update_appointment(&self, appointment: &Appointment) -> RepoResult<Appointment> {
        let path = format!("/rest/v1/appointments?id=eq.{}", encode(&appointment.id));
        self.write("Appointment", Method::PATCH, &path, appointment)
            .await
    }
}

#[async_trait]
impl ProductRepository for SupabaseStore {
    async fn get_product(&self, id: &str) -> RepoResult<Product> {
        self.select_one("Product", &format!("/rest/v1/products?id=eq.{}", encode(id)))
            .await
    }

    async fn list_products(&self, filters: &ProductFilters) -> RepoResult<Vec<Product>> {
        let mut path = "/rest/v1/products?is_active=eq.true&order=created_at.desc".to_string();
        if let Some(category) = &filters.category {
            path.push_str(&format!("&category=eq.{}", encode(category)));
        }
        if let Some(brand) = &filters.brand {
            path.push_str(&format!("&brand=eq.{}", encode(brand)));
        }
        if let Some(vet_id) = &filters.veterinarian_id {
            path.push_str(&format!("&veterinarian_id=eq.{}", encode(vet_id)));
        }
        if let Some(min) = filters.min_price {
            path.push_str(&format!("&price=gte.{}", min));
        }
        if let Some(max) = filters.max_price {
            path.push_str(&format!("&price=lte.{}", max));
        }
        if let Some(search) = filters.search.as_deref().filter(|s| !s.is_empty()) {
            let pattern = encode(&format!("*{}*", search));
            path.push_str(&format!(
                "&or=(name.ilike.{},description.ilike.{})",
                pattern, pattern
            ));
        }
        path.push_str(&format!(
            "&limit={}&offset={}",
            filters.limit(),
            filters.offset()
        ));
        self.select("Product", &path).await
    }

    async fn create_product(&self, product: &Product) -> RepoResult<Product> {
        self.write("Product", Method::POST, "/rest/v1/products", product)
            .await
    }

    async fn update_product(&self, product: &Product) -> RepoResult<Product> {
        let path = format!("/rest/v1/products?id=eq.{}", encode(&product.id));
        self.write("Product", Method::PATCH, &path, product).await
    }

    async fn set_product_stock(&self, id: &str, stock_quantity: i32) -> RepoResult<Product> {
        let path = format!("/rest/v1/products?id=eq.{}", encode(id));
        let body = json!({
            "stock_quantity": stock_quantity,
            "updated_at": Utc::now().to_rfc3339(),
        });
        self.write("Product", Method::PATCH, &path, &body).await
    }
}

#[async_trait]
impl OrderRepository for SupabaseStore {
    async fn get_order(&self, id: &str) -> RepoResult<Order> {
        self.select_one("Order", &format!("/rest/v1/orders?id=eq.{}", encode(id)))
            .await
    }

    async fn list_orders(&self, query: &OrderQuery) -> RepoResult<Vec<Order>> {
        let mut path = "/rest/v1/orders?order=created_at.desc".to_string();
        if let Some(client_id) = &query.client_id {
            path.push_str(&format!("&client_id=eq.{}", encode(client_id)));
        }
        if let Some(vet_id) = &query.veterinarian_id {
            path.push_str(&format!("&veterinarian_id=eq.{}", encode(vet_id)));
        }
        self.select("Order", &path).await
    }

    async fn list_order_items(&self, order_id: &str) -> RepoResult<Vec<OrderItem>> {
        let path = format!("/rest/v1/order_items?order_id=eq.{}", encode(order_id));
        self.select("Order item", &path).await
    }

    async fn create_order(&self, order: &Order, items: &[OrderItem]) -> RepoResult<Order> {
        self.rpc(
            "Order",
            "create_order_with_items",
            json!({ "p_order": order, "p_items": items }),
        )
        .await
    }

    async fn update_order_status(
        &self,
        id: &str,
        expected: OrderStatus,
        status: Option<OrderStatus>,
        payment_status: Option<PaymentStatus>,
    ) -> RepoResult<Order> {
        let mut update = serde_json::Map::new();
        if let Some(status) = status {
            update.insert("status".to_string(), json!(status));
        }
        if let Some(payment_status) = payment_status {
            update.insert("payment_status".to_string(), json!(payment_status));
        }
        update.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        // The status filter makes this a compare-and-set; zero rows back means
        // another request moved the order first.
        let path = format!(
            "/rest/v1/orders?id=eq.{}&status=eq.{}",
            encode(id),
            expected
        );
        self.write("Order", Method::PATCH, &path, &Value::Object(update))
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound(_) => RepositoryError::Conflict(
                    "Order status changed, reload the order and retry".to_string(),
                ),
                other => other,
            })
    }

    async fn cancel_order(&self, id: &str) -> RepoResult<Order> {
        self.rpc("Order", "cancel_order", json!({ "p_order_id": id }))
            .await
    }
}

#[async_trait]
impl Store for SupabaseStore {
    async fn ping(&self) -> RepoResult<()> {
        let _: Vec<Value> = self
            .supabase
            .request(Method::GET, "/rest/v1/veterinarians?select=id&limit=1", None)
            .await
            .map_err(|e| map_api_error("Database", e))?;
        Ok(())
    }
}
