//! Wi-Fi station bring-up and the `/desk` HTTP server.
//!
//! The handlers run on the HTTP server task and only touch the
//! [`DeskMailbox`]; routing and formatting live in [`crate::http`].

use alloc::boxed::Box;

use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::modem::Modem;
use esp_idf_svc::http::server::{Configuration as HttpConfig, EspHttpConnection, EspHttpServer, Request};
use esp_idf_svc::http::Method;
use esp_idf_svc::io::{EspIOError, Write};
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::sys::{esp_err_t, EspError, ESP_ERR_INVALID_ARG};
use esp_idf_svc::wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi};

use crate::config::{WifiConfig, HTTP_PORT};
use crate::http::{self, BodyBuffer, DeskRoute, DESK_PATH};
use crate::mailbox::DeskMailbox;

/// Connect as a station and block until the interface has an address.
pub fn connect_wifi(
    modem: Modem,
    sysloop: EspSystemEventLoop,
    nvs: EspDefaultNvsPartition,
    credentials: &WifiConfig,
) -> Result<Box<BlockingWifi<EspWifi<'static>>>, EspError> {
    let invalid = |_| EspError::from_infallible::<{ ESP_ERR_INVALID_ARG as esp_err_t }>();

    let mut wifi = Box::new(BlockingWifi::wrap(
        EspWifi::new(modem, sysloop.clone(), Some(nvs))?,
        sysloop,
    )?);

    let auth_method = if credentials.password.is_empty() {
        AuthMethod::None
    } else {
        AuthMethod::WPA2Personal
    };

    wifi.set_configuration(&Configuration::Client(ClientConfiguration {
        ssid: credentials.ssid.try_into().map_err(invalid)?,
        password: credentials.password.try_into().map_err(invalid)?,
        auth_method,
        ..Default::default()
    }))?;

    wifi.start()?;
    wifi.connect()?;
    wifi.wait_netif_up()?;

    Ok(wifi)
}

/// Start the HTTP server. Unmatched paths get 404.
pub fn serve(mailbox: &'static DeskMailbox) -> Result<EspHttpServer<'static>, EspError> {
    let mut server = EspHttpServer::new(&HttpConfig {
        http_port: HTTP_PORT,
        uri_match_wildcard: true,
        ..Default::default()
    })?;

    server.fn_handler(DESK_PATH, Method::Get, move |req| {
        let route = http::route(req.uri());
        reply(req, route, mailbox)
    })?;

    server.fn_handler("/*", Method::Get, move |req| reply(req, DeskRoute::NotFound, mailbox))?;

    Ok(server)
}

fn reply(
    req: Request<&mut EspHttpConnection<'_>>,
    route: DeskRoute,
    mailbox: &DeskMailbox,
) -> Result<(), EspIOError> {
    let mut body: BodyBuffer = [0; 32];
    let response = http::respond(route, mailbox, &mut body);

    let mut out = req.into_response(
        response.status,
        None,
        &[("Content-Type", response.content_type)],
    )?;
    out.write_all(response.body.as_bytes())?;
    Ok(())
}
