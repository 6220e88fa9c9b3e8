use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI document for the LED campaign backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::event_stream,
        crate::routes::websocket::ws_handler,
        crate::routes::state::get_state,
        crate::routes::state::get_preview,
        crate::routes::state::update_config,
        crate::routes::state::start_countdown,
        crate::routes::state::start_now,
        crate::routes::state::show_winner,
        crate::routes::state::stop,
        crate::routes::state::load_template,
        crate::routes::products::list_products,
        crate::routes::products::create_product,
        crate::routes::products::update_product,
        crate::routes::products::delete_product,
        crate::routes::templates::list_templates,
        crate::routes::templates::create_template,
        crate::routes::templates::delete_template,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::campaign::CampaignStateDto,
            crate::dto::campaign::ConfigPatch,
            crate::dto::campaign::ActionResponse,
            crate::dto::campaign::PreviewResponse,
            crate::dto::campaign::PreviewSlot,
            crate::dto::product::ProductDto,
            crate::dto::product::ProductInput,
            crate::dto::template::TemplateDto,
            crate::dto::template::TemplateInput,
            crate::dto::template::TemplateConfigDto,
            crate::dto::ws::AdminAction,
            crate::dto::ws::OutboundMessage,
            crate::state::campaign::Phase,
            crate::state::campaign::SlotType,
            crate::state::campaign::DiscountType,
            crate::state::campaign::SlotEntry,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "state", description = "Campaign state and phase control"),
        (name = "products", description = "Product catalogue"),
        (name = "templates", description = "Saved slot templates"),
        (name = "channel", description = "Realtime WebSocket and SSE channels"),
    )
)]
pub struct ApiDoc;
