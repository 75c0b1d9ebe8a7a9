//! Gateway: wires hub sessions and voice-assistant directives together.
//!
//! Hub side: accept connections, authenticate them, keep their device
//! stores in sync, and route replies to waiting callers. Directive side:
//! authenticate the bearer token, then answer discovery from the user's hubs
//! or translate control into a hub command.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use hubgate_domain::directive::{ControlRequest, Directive, DirectiveKind, Response};
use hubgate_domain::error::{HubGateError, NotFoundError};
use hubgate_domain::hub::{self, AuthorizeRequest, DeviceList, HubCommand, HubEvent, HubMessage};
use hubgate_domain::id::ConnectionId;
use hubgate_domain::time::{self, Timestamp};

use crate::connection::{Connection, Outbound};
use crate::ports::TokenIntrospector;
use crate::registry::{ConnectionRegistry, HubIdentity};
use crate::translator;

/// Default bound on any correlated hub call.
pub const DEFAULT_REPLY_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatewayConfig {
    /// How long a caller waits for a hub reply before giving up.
    pub reply_timeout: Duration,
    /// Wait for the hub's reply to a control command instead of confirming
    /// immediately.
    pub await_confirmation: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            reply_timeout: DEFAULT_REPLY_TIMEOUT,
            await_confirmation: false,
        }
    }
}

/// Operational view of one registered connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HubStatus {
    pub connection_id: ConnectionId,
    pub connected_at: Timestamp,
    pub uptime_secs: u64,
    pub identity: Option<HubIdentity>,
    pub devices: usize,
    pub pending_requests: usize,
}

pub struct Gateway<TI> {
    registry: Arc<ConnectionRegistry>,
    introspector: TI,
    config: GatewayConfig,
}

impl<TI: TokenIntrospector> Gateway<TI> {
    #[must_use]
    pub fn new(introspector: TI, config: GatewayConfig) -> Self {
        Self {
            registry: Arc::new(ConnectionRegistry::new()),
            introspector,
            config,
        }
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    // -- hub side --------------------------------------------------------

    /// Register a new hub session whose outbound frames go to `outbound`.
    pub fn connect(&self, outbound: Outbound) -> Arc<Connection> {
        let connection = Arc::new(Connection::new(outbound));
        self.registry.register(Arc::clone(&connection));
        tracing::info!(connection_id = %connection.id(), "hub connected");
        connection
    }

    /// Unregister a hub session and fail everything still waiting on it.
    pub async fn disconnect(&self, connection: &Connection) {
        self.registry.unregister(connection.id());
        let cancelled = connection.close().await;
        tracing::info!(connection_id = %connection.id(), cancelled, "hub disconnected");
    }

    /// Process one text frame received from a hub.
    ///
    /// Malformed frames are logged and dropped; they never tear down the
    /// session.
    #[tracing::instrument(skip(self, connection, frame), fields(connection_id = %connection.id()))]
    pub async fn handle_hub_frame(&self, connection: &Arc<Connection>, frame: &str) {
        let message = match HubMessage::parse(frame) {
            Ok(message) => message,
            Err(err) => {
                tracing::warn!(error = %err, "dropping malformed hub frame");
                return;
            }
        };

        if let Some(mid) = message.reply_to() {
            if connection.resolve(mid, message.payload.clone()).await {
                tracing::debug!(%mid, name = %message.name, "hub reply delivered");
                return;
            }
        }

        match message.event() {
            Ok(HubEvent::Authorize(request)) => self.authorize(connection, request).await,
            Ok(HubEvent::DeviceListUpdate(list)) => {
                let outcome = connection.sync_devices(list.devices).await;
                tracing::debug!(
                    added = outcome.added.len(),
                    removed = outcome.removed.len(),
                    "device list reconciled"
                );
            }
            Ok(HubEvent::ValueUpdate(update)) => {
                if let Err(err) = connection.update_value(update).await {
                    tracing::debug!(error = %err, "dropping value update");
                }
            }
            Ok(HubEvent::Unknown(name)) => {
                tracing::debug!(%name, mid = ?message.mid, "ignoring hub message");
            }
            Err(err) => tracing::warn!(error = %err, "dropping malformed hub message"),
        }
    }

    async fn authorize(&self, connection: &Arc<Connection>, request: AuthorizeRequest) {
        let username = match self.introspector.introspect(&request.token).await {
            Ok(info) => info.username().map(str::to_owned),
            Err(err) => {
                tracing::warn!(error = %err, hub_id = %request.uuid, "hub token introspection failed");
                return;
            }
        };
        let Some(username) = username else {
            tracing::warn!(hub_id = %request.uuid, "hub presented an inactive token");
            return;
        };

        let identity = HubIdentity {
            username,
            hub_id: request.uuid,
            display_name: request.name,
        };
        tracing::info!(hub_id = %identity.hub_id, username = %identity.username, "hub authenticated");
        let hub_id = identity.hub_id.clone();
        let superseded = match self.registry.authenticate(connection.id(), identity) {
            Ok(superseded) => superseded,
            Err(err) => {
                tracing::warn!(error = %err, "hub went away during authorization");
                return;
            }
        };
        for stale in superseded {
            let cancelled = stale.close().await;
            tracing::info!(
                %hub_id,
                connection_id = %stale.id(),
                cancelled,
                "previous hub session superseded"
            );
        }

        // The reply arrives through this connection's own frame loop.
        let connection = Arc::clone(connection);
        let timeout = self.config.reply_timeout;
        tokio::spawn(async move { fetch_devices(&connection, timeout).await });
    }

    // -- directive side --------------------------------------------------

    /// Answer one directive.
    ///
    /// Returns `Ok(None)` for directives this gateway does not implement.
    ///
    /// # Errors
    ///
    /// - [`HubGateError::Unauthorized`] / [`HubGateError::Upstream`] when the
    ///   access token does not resolve to a username.
    /// - [`HubGateError::Validation`] for malformed control directives.
    /// - Anything [`Gateway::control`] returns.
    #[tracing::instrument(skip(self, directive), fields(namespace = %directive.header.namespace, name = %directive.header.name))]
    pub async fn handle_directive(
        &self,
        directive: &Directive,
    ) -> Result<Option<Response>, HubGateError> {
        let username = self.authenticate(directive.access_token()).await?;
        match directive.kind() {
            DirectiveKind::Discovery => Ok(Some(self.discover(&username).await)),
            DirectiveKind::Control => match ControlRequest::from_directive(directive)? {
                Some(request) => self.control(&username, &request).await.map(Some),
                None => Ok(None),
            },
            DirectiveKind::Unsupported => Ok(None),
        }
    }

    /// Resolve a bearer token to a username.
    ///
    /// # Errors
    ///
    /// Returns [`HubGateError::Unauthorized`] for an empty, inactive, or
    /// anonymous token, or the introspector's error.
    pub async fn authenticate(&self, token: &str) -> Result<String, HubGateError> {
        if token.is_empty() {
            return Err(HubGateError::Unauthorized);
        }
        let info = self.introspector.introspect(token).await?;
        info.username()
            .map(str::to_owned)
            .ok_or(HubGateError::Unauthorized)
    }

    /// Describe every appliance of every hub owned by `username`.
    #[tracing::instrument(skip(self))]
    pub async fn discover(&self, username: &str) -> Response {
        let mut found = Vec::new();
        for hub in self.registry.hubs_for_username(username) {
            let appliances = hub
                .connection
                .with_devices(|store| translator::appliances(&hub.identity, store))
                .await;
            found.extend(appliances);
        }
        tracing::debug!(appliances = found.len(), "discovery answered");
        Response::discovery(found)
    }

    /// Carry out one control request on a hub owned by `username`.
    ///
    /// # Errors
    ///
    /// - [`HubGateError::NotFound`] when the hub, device, or resource is
    ///   unknown, or the hub belongs to someone else.
    /// - [`HubGateError::Validation`] when a percentage action targets a
    ///   resource that is not dimmable.
    /// - [`HubGateError::Hub`] when the hub is gone or, with confirmation
    ///   waiting enabled, does not answer in time.
    #[tracing::instrument(skip(self, request), fields(appliance_id = %request.address))]
    pub async fn control(
        &self,
        username: &str,
        request: &ControlRequest,
    ) -> Result<Response, HubGateError> {
        let address = &request.address;
        let hub = self
            .registry
            .find_by_hub_id(username, &address.hub_id)
            .ok_or_else(|| NotFoundError {
                entity: "Hub",
                id: address.hub_id.clone(),
            })?;

        let command = hub
            .connection
            .with_devices(|store| -> Result<HubCommand, HubGateError> {
                let device = store.get(&address.device_id).ok_or_else(|| NotFoundError {
                    entity: "Device",
                    id: address.device_id.clone(),
                })?;
                translator::command_for(device, address, request.action)
            })
            .await?;

        if self.config.await_confirmation {
            hub.connection
                .call(&command, self.config.reply_timeout)
                .await?;
        } else {
            hub.connection.submit(&command).await?;
        }
        Ok(Response::confirmation(request.action))
    }

    /// Status of every registered connection.
    pub async fn hubs(&self) -> Vec<HubStatus> {
        let now = time::now();
        let mut out = Vec::new();
        for entry in self.registry.list() {
            out.push(HubStatus {
                connection_id: entry.id(),
                connected_at: entry.connected_at(),
                uptime_secs: time::seconds_between(entry.connected_at(), now),
                identity: entry.identity.clone(),
                devices: entry.connection.with_devices(|store| store.len()).await,
                pending_requests: entry.connection.pending_requests().await,
            });
        }
        out
    }
}

async fn fetch_devices(connection: &Connection, timeout: Duration) {
    let payload = match connection
        .call(&HubCommand::RequestGetDevices {}, timeout)
        .await
    {
        Ok(payload) => payload,
        Err(err) => {
            tracing::warn!(error = %err, connection_id = %connection.id(), "initial device fetch failed");
            return;
        }
    };
    match hub::decode::<DeviceList>("RequestGetDevices", &payload) {
        Ok(list) => {
            let outcome = connection.sync_devices(list.devices).await;
            tracing::info!(
                connection_id = %connection.id(),
                devices = outcome.added.len(),
                "initial device list applied"
            );
        }
        Err(err) => tracing::warn!(error = %err, "dropping malformed device list"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use hubgate_domain::auth::TokenInfo;
    use hubgate_domain::directive::{ControlAction, ResponsePayload};
    use hubgate_domain::error::{HubError, ValidationError};
    use serde_json::{Value, json};
    use tokio::sync::mpsc;

    struct StubIntrospector {
        users: HashMap<&'static str, &'static str>,
    }

    impl StubIntrospector {
        fn new() -> Self {
            Self {
                users: HashMap::from([
                    ("alice-token", "alice"),
                    ("alice-hub-token", "alice"),
                    ("bob-token", "bob"),
                    ("bob-hub-token", "bob"),
                ]),
            }
        }
    }

    impl TokenIntrospector for StubIntrospector {
        async fn introspect(&self, token: &str) -> Result<TokenInfo, HubGateError> {
            if token == "broken" {
                return Err(HubGateError::Upstream("introspection unavailable".into()));
            }
            Ok(match self.users.get(token) {
                Some(user) => TokenInfo {
                    active: true,
                    username: (*user).to_string(),
                },
                None => TokenInfo::default(),
            })
        }
    }

    fn gateway(config: GatewayConfig) -> Arc<Gateway<StubIntrospector>> {
        Arc::new(Gateway::new(StubIntrospector::new(), config))
    }

    async fn next_frame(rx: &mut mpsc::UnboundedReceiver<String>) -> Value {
        serde_json::from_str(&rx.recv().await.unwrap()).unwrap()
    }

    fn lamp() -> Value {
        json!({
            "id": "D1",
            "name": "Lamp",
            "resources": [
                {"path": "/master", "resourceType": "oic.r.switch", "value": {"value": false}},
                {"path": "/dim", "resourceType": "oic.r.light.dimming",
                 "value": {"dimmingSetting": 10, "range": "0,100"}}
            ]
        })
    }

    /// Connect and authorize hub `hub_id`, answering its initial
    /// `RequestGetDevices` with `devices`.
    async fn authorized_hub(
        gateway: &Gateway<StubIntrospector>,
        token: &str,
        hub_id: &str,
        devices: Value,
    ) -> (Arc<Connection>, mpsc::UnboundedReceiver<String>) {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let connection = gateway.connect(tx);
        let authorize = json!({
            "name": "RequestAuthorize",
            "payload": {"token": token, "uuid": hub_id, "name": format!("{hub_id} hub")}
        });
        gateway
            .handle_hub_frame(&connection, &authorize.to_string())
            .await;

        let request = next_frame(&mut rx).await;
        assert_eq!(request["name"], "RequestGetDevices");
        let count = devices.as_array().map_or(0, Vec::len);
        let reply = json!({"mid": request["mid"], "name": "ResponseGetDevices", "payload": {"devices": devices}});
        gateway.handle_hub_frame(&connection, &reply.to_string()).await;
        for _ in 0..count {
            assert_eq!(next_frame(&mut rx).await["name"], "RequestSubscribeDevice");
        }
        (connection, rx)
    }

    fn directive(namespace: &str, name: &str, token: &str, payload: Value) -> Directive {
        let mut body = json!({"accessToken": token});
        if let (Some(body), Some(extra)) = (body.as_object_mut(), payload.as_object()) {
            body.extend(extra.clone());
        }
        serde_json::from_value(json!({
            "header": {"namespace": namespace, "name": name, "payloadVersion": "2", "messageId": "m-1"},
            "payload": body
        }))
        .unwrap()
    }

    fn control(name: &str, appliance_id: &str, extra: Value) -> Directive {
        let mut payload = json!({"appliance": {"applianceId": appliance_id}});
        if let (Some(payload), Some(extra)) = (payload.as_object_mut(), extra.as_object()) {
            payload.extend(extra.clone());
        }
        directive("Alexa.ConnectedHome.Control", name, "alice-token", payload)
    }

    fn discovered_ids(response: &Response) -> Vec<String> {
        match &response.payload {
            ResponsePayload::Discovery(p) => p
                .discovered_appliances
                .iter()
                .map(|a| a.appliance_id.clone())
                .collect(),
            ResponsePayload::Empty(_) => panic!("expected discovery payload"),
        }
    }

    #[tokio::test]
    async fn should_discover_switch_and_dimmer_of_owned_hub() {
        let gw = gateway(GatewayConfig::default());
        let _hub = authorized_hub(&gw, "alice-hub-token", "H1", json!([lamp()])).await;

        let response = gw
            .handle_directive(&directive(
                "Alexa.ConnectedHome.Discovery",
                "DiscoverAppliancesRequest",
                "alice-token",
                json!({}),
            ))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(response.header.name, "DiscoverAppliancesResponse");
        assert_eq!(discovered_ids(&response), vec!["H1:D1", "H1:D1:_dim"]);
    }

    #[tokio::test]
    async fn should_aggregate_discovery_across_hubs_of_same_user() {
        let gw = gateway(GatewayConfig::default());
        let _h1 = authorized_hub(&gw, "alice-hub-token", "H1", json!([lamp()])).await;
        let _h2 = authorized_hub(&gw, "alice-hub-token", "H2", json!([{"id": "D7", "resources": [{"path": "/master"}]}])).await;
        let _h3 = authorized_hub(&gw, "bob-hub-token", "H3", json!([lamp()])).await;

        let ids = discovered_ids(&gw.discover("alice").await);

        assert_eq!(ids, vec!["H1:D1", "H1:D1:_dim", "H2:D7"]);
    }

    #[tokio::test]
    async fn should_return_empty_discovery_when_user_has_no_hub() {
        let gw = gateway(GatewayConfig::default());
        assert!(discovered_ids(&gw.discover("carol").await).is_empty());
    }

    #[tokio::test]
    async fn should_send_scaled_set_value_and_confirm_immediately() {
        let gw = gateway(GatewayConfig::default());
        let device = json!({
            "id": "D1",
            "resources": [{"path": "/dim", "resourceType": "oic.r.light.dimming",
                           "value": {"dimmingSetting": 0, "range": "0,200"}}]
        });
        let (_conn, mut rx) = authorized_hub(&gw, "alice-hub-token", "H1", json!([device])).await;

        let response = gw
            .handle_directive(&control(
                "SetPercentageRequest",
                "H1:D1:_dim",
                json!({"percentageState": {"value": 50}}),
            ))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(response.header.name, "SetPercentageConfirmation");
        assert_eq!(response.header.namespace, "Alexa.ConnectedHome.Control");
        let frame = next_frame(&mut rx).await;
        assert_eq!(frame["name"], "RequestSetValue");
        assert_eq!(
            frame["payload"],
            json!({"di": "D1", "resource": "/dim", "value": {"dimmingSetting": 100}})
        );
    }

    #[tokio::test]
    async fn should_clamp_decrement_to_zero() {
        let gw = gateway(GatewayConfig::default());
        let (_conn, mut rx) = authorized_hub(&gw, "alice-hub-token", "H1", json!([lamp()])).await;

        gw.handle_directive(&control(
            "DecrementPercentageRequest",
            "H1:D1:_dim",
            json!({"deltaPercentage": {"value": 20}}),
        ))
        .await
        .unwrap();

        let frame = next_frame(&mut rx).await;
        assert_eq!(frame["payload"]["value"], json!({"dimmingSetting": 0}));
    }

    #[tokio::test]
    async fn should_use_pushed_value_for_relative_change() {
        let gw = gateway(GatewayConfig::default());
        let (conn, mut rx) = authorized_hub(&gw, "alice-hub-token", "H1", json!([lamp()])).await;
        let update = json!({
            "name": "EventValueUpdate",
            "payload": {"di": "D1", "resource": "/dim", "value": {"dimmingSetting": 60, "range": "0,100"}}
        });
        gw.handle_hub_frame(&conn, &update.to_string()).await;

        gw.handle_directive(&control(
            "IncrementPercentageRequest",
            "H1:D1:_dim",
            json!({"deltaPercentage": {"value": 15}}),
        ))
        .await
        .unwrap();

        let frame = next_frame(&mut rx).await;
        assert_eq!(frame["payload"]["value"], json!({"dimmingSetting": 75}));
    }

    #[tokio::test]
    async fn should_apply_value_update_tagged_with_negative_mid() {
        let gw = gateway(GatewayConfig::default());
        let (conn, mut rx) = authorized_hub(&gw, "alice-hub-token", "H1", json!([lamp()])).await;
        let update = json!({
            "mid": -1,
            "name": "EventValueUpdate",
            "payload": {"di": "D1", "resource": "/dim", "value": {"dimmingSetting": 60, "range": "0,100"}}
        });
        gw.handle_hub_frame(&conn, &update.to_string()).await;

        gw.handle_directive(&control(
            "IncrementPercentageRequest",
            "H1:D1:_dim",
            json!({"deltaPercentage": {"value": 15}}),
        ))
        .await
        .unwrap();

        let frame = next_frame(&mut rx).await;
        assert_eq!(frame["payload"]["value"], json!({"dimmingSetting": 75}));
    }

    #[tokio::test]
    async fn should_route_to_newest_session_when_hub_reconnects() {
        let gw = gateway(GatewayConfig::default());
        // The old socket is half-open: its receiver stays alive.
        let (old, mut old_rx) =
            authorized_hub(&gw, "alice-hub-token", "H1", json!([lamp()])).await;
        let (_new, mut new_rx) =
            authorized_hub(&gw, "alice-hub-token", "H1", json!([lamp()])).await;

        let response = gw
            .handle_directive(&directive(
                "Alexa.ConnectedHome.Discovery",
                "DiscoverAppliancesRequest",
                "alice-token",
                json!({}),
            ))
            .await
            .unwrap()
            .unwrap();
        gw.handle_directive(&control("TurnOnRequest", "H1:D1", json!({})))
            .await
            .unwrap();

        assert_eq!(discovered_ids(&response), vec!["H1:D1", "H1:D1:_dim"]);
        assert_eq!(gw.registry().len(), 1);
        assert_eq!(next_frame(&mut new_rx).await["name"], "RequestSetValue");
        assert!(old_rx.try_recv().is_err());
        let err = old.submit(&HubCommand::RequestGetDevices {}).await.unwrap_err();
        assert_eq!(err, HubError::Disconnected);
    }

    #[tokio::test]
    async fn should_reach_own_hub_when_another_user_claims_same_hub_id() {
        let gw = gateway(GatewayConfig::default());
        let (_bob, mut bob_rx) = authorized_hub(&gw, "bob-hub-token", "H1", json!([lamp()])).await;
        let (_alice, mut alice_rx) =
            authorized_hub(&gw, "alice-hub-token", "H1", json!([lamp()])).await;

        gw.handle_directive(&control("TurnOnRequest", "H1:D1", json!({})))
            .await
            .unwrap();

        assert_eq!(next_frame(&mut alice_rx).await["name"], "RequestSetValue");
        assert!(bob_rx.try_recv().is_err());
        assert_eq!(gw.registry().len(), 2);
    }

    #[tokio::test]
    async fn should_report_not_found_when_hub_belongs_to_another_user() {
        let gw = gateway(GatewayConfig::default());
        let _bob = authorized_hub(&gw, "bob-hub-token", "H9", json!([lamp()])).await;

        let err = gw
            .handle_directive(&control("TurnOnRequest", "H9:D1", json!({})))
            .await
            .unwrap_err();

        assert!(matches!(err, HubGateError::NotFound(e) if e.entity == "Hub"));
    }

    #[tokio::test]
    async fn should_report_not_found_when_device_is_unknown() {
        let gw = gateway(GatewayConfig::default());
        let _hub = authorized_hub(&gw, "alice-hub-token", "H1", json!([lamp()])).await;

        let err = gw
            .handle_directive(&control("TurnOffRequest", "H1:D404", json!({})))
            .await
            .unwrap_err();

        assert!(matches!(err, HubGateError::NotFound(e) if e.entity == "Device"));
    }

    #[tokio::test]
    async fn should_reject_percentage_on_switch_resource() {
        let gw = gateway(GatewayConfig::default());
        let _hub = authorized_hub(&gw, "alice-hub-token", "H1", json!([lamp()])).await;

        let err = gw
            .handle_directive(&control(
                "SetPercentageRequest",
                "H1:D1:_master",
                json!({"percentageState": {"value": 10}}),
            ))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            HubGateError::Validation(ValidationError::UnsupportedResource { .. })
        ));
    }

    #[tokio::test]
    async fn should_reject_directive_when_token_is_inactive() {
        let gw = gateway(GatewayConfig::default());

        let err = gw
            .handle_directive(&directive(
                "Alexa.ConnectedHome.Discovery",
                "DiscoverAppliancesRequest",
                "unknown-token",
                json!({}),
            ))
            .await
            .unwrap_err();

        assert!(matches!(err, HubGateError::Unauthorized));
    }

    #[tokio::test]
    async fn should_propagate_upstream_error_when_introspection_fails() {
        let gw = gateway(GatewayConfig::default());
        let err = gw.authenticate("broken").await.unwrap_err();
        assert!(matches!(err, HubGateError::Upstream(_)));
    }

    #[tokio::test]
    async fn should_answer_nothing_for_unsupported_directive() {
        let gw = gateway(GatewayConfig::default());

        let response = gw
            .handle_directive(&directive(
                "Alexa.ConnectedHome.Query",
                "GetTargetTemperatureRequest",
                "alice-token",
                json!({}),
            ))
            .await
            .unwrap();

        assert!(response.is_none());
    }

    #[tokio::test]
    async fn should_fail_waiting_control_when_hub_disconnects() {
        let gw = gateway(GatewayConfig {
            reply_timeout: Duration::from_secs(60),
            await_confirmation: true,
        });
        let (conn, mut rx) = authorized_hub(&gw, "alice-hub-token", "H1", json!([lamp()])).await;

        let pending = {
            let gw = Arc::clone(&gw);
            tokio::spawn(async move {
                gw.handle_directive(&control("TurnOnRequest", "H1:D1", json!({})))
                    .await
            })
        };
        assert_eq!(next_frame(&mut rx).await["name"], "RequestSetValue");
        gw.disconnect(&conn).await;

        let err = pending.await.unwrap().unwrap_err();
        assert!(matches!(err, HubGateError::Hub(HubError::Disconnected)));
        assert!(gw.registry().is_empty());
    }

    #[tokio::test]
    async fn should_confirm_after_hub_replies_when_awaiting() {
        let gw = gateway(GatewayConfig {
            reply_timeout: Duration::from_secs(60),
            await_confirmation: true,
        });
        let (conn, mut rx) = authorized_hub(&gw, "alice-hub-token", "H1", json!([lamp()])).await;

        let pending = {
            let gw = Arc::clone(&gw);
            tokio::spawn(async move {
                gw.handle_directive(&control("TurnOffRequest", "H1:D1", json!({})))
                    .await
            })
        };
        let frame = next_frame(&mut rx).await;
        let reply = json!({"mid": frame["mid"], "name": "ResponseSetValue", "payload": {}});
        gw.handle_hub_frame(&conn, &reply.to_string()).await;

        let response = pending.await.unwrap().unwrap().unwrap();
        assert_eq!(response.header.name, "TurnOffConfirmation");
    }

    #[tokio::test(start_paused = true)]
    async fn should_time_out_and_drop_pending_entry_when_hub_is_silent() {
        let gw = gateway(GatewayConfig {
            reply_timeout: Duration::from_secs(5),
            await_confirmation: true,
        });
        let (conn, _rx) = authorized_hub(&gw, "alice-hub-token", "H1", json!([lamp()])).await;

        let err = gw
            .handle_directive(&control("TurnOnRequest", "H1:D1", json!({})))
            .await
            .unwrap_err();

        assert!(matches!(err, HubGateError::Hub(HubError::Timeout(_))));
        assert_eq!(conn.pending_requests().await, 0);
    }

    #[tokio::test]
    async fn should_report_disconnected_when_controlling_a_closed_hub() {
        let gw = gateway(GatewayConfig::default());
        let (conn, _rx) = authorized_hub(&gw, "alice-hub-token", "H1", json!([lamp()])).await;
        conn.close().await;

        let err = gw
            .control(
                "alice",
                &ControlRequest {
                    address: "H1:D1".parse().unwrap(),
                    action: ControlAction::TurnOn,
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, HubGateError::Hub(HubError::Disconnected)));
    }

    #[tokio::test]
    async fn should_leave_hub_unauthenticated_when_token_is_inactive() {
        let gw = gateway(GatewayConfig::default());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let conn = gw.connect(tx);
        let authorize = json!({"name": "RequestAuthorize", "payload": {"token": "nope", "uuid": "H1"}});

        gw.handle_hub_frame(&conn, &authorize.to_string()).await;

        assert_eq!(gw.registry().len(), 1);
        assert!(gw.registry().find_by_hub_id("alice", "H1").is_none());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn should_not_resubscribe_when_same_snapshot_is_pushed_again() {
        let gw = gateway(GatewayConfig::default());
        let (conn, mut rx) = authorized_hub(&gw, "alice-hub-token", "H1", json!([lamp()])).await;
        let update = json!({"name": "EventDeviceListUpdate", "payload": {"devices": [lamp()]}});

        gw.handle_hub_frame(&conn, &update.to_string()).await;
        gw.handle_hub_frame(&conn, &update.to_string()).await;

        assert!(rx.try_recv().is_err());
        assert_eq!(conn.with_devices(|s| s.len()).await, 1);
    }

    #[tokio::test]
    async fn should_unsubscribe_device_missing_from_snapshot() {
        let gw = gateway(GatewayConfig::default());
        let (conn, mut rx) = authorized_hub(&gw, "alice-hub-token", "H1", json!([lamp()])).await;
        let update = json!({"name": "EventDeviceListUpdate", "payload": {"devices": []}});

        gw.handle_hub_frame(&conn, &update.to_string()).await;

        let frame = next_frame(&mut rx).await;
        assert_eq!(frame["name"], "RequestUnsubscribeDevice");
        assert_eq!(frame["payload"]["uuid"], "D1");
    }

    #[tokio::test]
    async fn should_ignore_malformed_and_unknown_frames() {
        let gw = gateway(GatewayConfig::default());
        let (conn, mut rx) = authorized_hub(&gw, "alice-hub-token", "H1", json!([lamp()])).await;

        gw.handle_hub_frame(&conn, "not json").await;
        gw.handle_hub_frame(&conn, r#"{"name": "EventDeviceListUpdate", "payload": {"devices": 3}}"#)
            .await;
        gw.handle_hub_frame(&conn, r#"{"name": "EventSomethingElse", "payload": {}}"#)
            .await;
        gw.handle_hub_frame(&conn, r#"{"mid": 999, "name": "Late", "payload": {}}"#)
            .await;

        assert!(rx.try_recv().is_err());
        assert_eq!(conn.with_devices(|s| s.len()).await, 1);
        assert_eq!(gw.registry().len(), 1);
    }

    #[tokio::test]
    async fn should_report_status_of_registered_hubs() {
        let gw = gateway(GatewayConfig::default());
        let (conn, _rx) = authorized_hub(&gw, "alice-hub-token", "H1", json!([lamp()])).await;
        let (tx, _anon_rx) = mpsc::unbounded_channel();
        let _anonymous = gw.connect(tx);

        let hubs = gw.hubs().await;

        assert_eq!(hubs.len(), 2);
        assert_eq!(hubs[0].connection_id, conn.id());
        assert_eq!(hubs[0].devices, 1);
        assert_eq!(hubs[0].pending_requests, 0);
        assert_eq!(hubs[0].identity.as_ref().unwrap().hub_id, "H1");
        assert!(hubs[1].identity.is_none());
    }
}
