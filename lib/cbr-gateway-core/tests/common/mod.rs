#![allow(
    clippy::missing_errors_doc,
    dead_code,
    missing_docs,
    clippy::expect_used
)]
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::routing::get;
use rstest::fixture;
use tracing::info;

use cbr_gateway_core::{Gateway, SchemaId};

pub const DAILY_PATH: &str = "/DailyInfoWebServ/DailyInfo.asmx";
const NAMESPACE: &str = "http://web.cbr.ru/";

pub fn init_tracing() {
    // should be run once, fail otherwise, we skip that error
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();

    info!("Tracing initialized");
}

/// A request received by the fake service.
#[derive(Debug, Clone)]
pub struct ReceivedCall {
    pub soap_action: Option<String>,
    pub content_type: Option<String>,
    pub body: String,
}

#[derive(Debug, Default)]
pub struct ServerState {
    wsdl_loads: AtomicUsize,
    calls: Mutex<Vec<ReceivedCall>>,
    base_url: Mutex<String>,
}

impl ServerState {
    pub fn wsdl_loads(&self) -> usize {
        self.wsdl_loads.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<ReceivedCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// An in-process daily service speaking SOAP 1.1.
#[derive(Debug)]
pub struct SoapServer {
    pub addr: SocketAddr,
    pub state: Arc<ServerState>,
}

impl SoapServer {
    pub async fn start() -> anyhow::Result<Self> {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let state = Arc::new(ServerState::default());
        *state.base_url.lock().unwrap_or_else(PoisonError::into_inner) =
            format!("http://{addr}");

        let app = Router::new()
            .route(DAILY_PATH, get(wsdl).post(soap))
            .with_state(Arc::clone(&state));
        info!(%addr, "launching fake SOAP service");
        tokio::spawn(async move {
            axum::serve(listener, app.into_make_service()).await.expect("server launched");
        });

        Ok(Self { addr, state })
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    pub fn gateway(&self) -> Gateway {
        Gateway::builder()
            .with_endpoint(SchemaId::Daily, self.url(&format!("{DAILY_PATH}?WSDL")))
            .with_endpoint(SchemaId::Market, self.url("/secinfo/missing.asmx?WSDL"))
            .build()
            .expect("valid gateway")
    }
}

#[fixture]
pub async fn server() -> SoapServer {
    init_tracing();
    match SoapServer::start().await {
        Ok(server) => server,
        Err(error) => {
            panic!("fail to start fake SOAP service: {error:?}");
        }
    }
}

async fn wsdl(State(state): State<Arc<ServerState>>) -> SoapResponse {
    state.wsdl_loads.fetch_add(1, Ordering::SeqCst);
    let base_url = state
        .base_url
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone();

    xml_response(StatusCode::OK, DAILY_WSDL.replace("{base_url}", &base_url))
}

async fn soap(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    body: String,
) -> SoapResponse {
    let header_text = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    };
    let call = ReceivedCall {
        soap_action: header_text("soapaction"),
        content_type: header_text(header::CONTENT_TYPE.as_str()),
        body,
    };
    let action = call.soap_action.clone().unwrap_or_default();
    let body = call.body.clone();
    state
        .calls
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(call);

    match action.trim_matches('"').trim_start_matches(NAMESPACE) {
        "GetCursOnDate" if body.contains("<On_date>2014-09-01T00:00:00</On_date>") => {
            xml_response(StatusCode::OK, envelope(COURSES_RESPONSE))
        }
        "GetCursOnDate" => xml_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            fault("soap:Client", "No data for this date"),
        ),
        "GetLatestDateTime" => xml_response(StatusCode::OK, envelope(LATEST_DATE_RESPONSE)),
        "Broken" => (
            StatusCode::BAD_GATEWAY,
            [(header::CONTENT_TYPE, "text/plain".to_string())],
            "upstream unavailable".to_string(),
        ),
        _ => xml_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            fault("soap:Server", "Server was unable to process request."),
        ),
    }
}

type SoapResponse = (StatusCode, [(header::HeaderName, String); 1], String);

fn xml_response(status: StatusCode, body: String) -> SoapResponse {
    (
        status,
        [(header::CONTENT_TYPE, "text/xml; charset=utf-8".to_string())],
        body,
    )
}

fn envelope(content: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?><soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xmlns:xsd="http://www.w3.org/2001/XMLSchema"><soap:Body>{content}</soap:Body></soap:Envelope>"#
    )
}

fn fault(code: &str, message: &str) -> String {
    envelope(&format!(
        "<soap:Fault><faultcode>{code}</faultcode><faultstring>{message}</faultstring><detail /></soap:Fault>"
    ))
}

const LATEST_DATE_RESPONSE: &str = r#"<GetLatestDateTimeResponse xmlns="http://web.cbr.ru/"><GetLatestDateTimeResult>2014-09-01T00:00:00</GetLatestDateTimeResult></GetLatestDateTimeResponse>"#;

const COURSES_RESPONSE: &str = r#"<GetCursOnDateResponse xmlns="http://web.cbr.ru/"><GetCursOnDateResult><xs:schema id="ValuteData" xmlns="" xmlns:xs="http://www.w3.org/2001/XMLSchema" xmlns:msdata="urn:schemas-microsoft-com:xml-msdata"><xs:element name="ValuteData" msdata:IsDataSet="true"/></xs:schema><diffgr:diffgram xmlns:msdata="urn:schemas-microsoft-com:xml-msdata" xmlns:diffgr="urn:schemas-microsoft-com:xml-diffgram-v1"><ValuteData xmlns=""><ValuteCursOnDate diffgr:id="ValuteCursOnDate1" msdata:rowOrder="0"><Vname>Доллар США                                                                                                                                                                                                                                                      </Vname><Vnom>1</Vnom><Vcurs>37.9064</Vcurs><Vcode>840</Vcode><VchCode>USD</VchCode></ValuteCursOnDate><ValuteCursOnDate diffgr:id="ValuteCursOnDate2" msdata:rowOrder="1"><Vname>Евро</Vname><Vnom>1</Vnom><Vcurs>49.8137</Vcurs><Vcode>978</Vcode><VchCode>EUR</VchCode></ValuteCursOnDate></ValuteData></diffgr:diffgram></GetCursOnDateResult></GetCursOnDateResponse>"#;

const DAILY_WSDL: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<wsdl:definitions xmlns:soap="http://schemas.xmlsoap.org/wsdl/soap/" xmlns:tns="http://web.cbr.ru/" xmlns:s="http://www.w3.org/2001/XMLSchema" xmlns:wsdl="http://schemas.xmlsoap.org/wsdl/" targetNamespace="http://web.cbr.ru/">
  <wsdl:types>
    <s:schema elementFormDefault="qualified" targetNamespace="http://web.cbr.ru/">
      <s:element name="GetCursOnDate">
        <s:complexType>
          <s:sequence>
            <s:element minOccurs="1" maxOccurs="1" name="On_date" type="s:dateTime" />
          </s:sequence>
        </s:complexType>
      </s:element>
      <s:element name="GetCursOnDateResponse">
        <s:complexType>
          <s:sequence>
            <s:element minOccurs="0" maxOccurs="1" name="GetCursOnDateResult">
              <s:complexType>
                <s:sequence>
                  <s:element ref="s:schema" />
                  <s:any />
                </s:sequence>
              </s:complexType>
            </s:element>
          </s:sequence>
        </s:complexType>
      </s:element>
      <s:element name="GetLatestDateTime">
        <s:complexType />
      </s:element>
      <s:element name="GetLatestDateTimeResponse">
        <s:complexType>
          <s:sequence>
            <s:element minOccurs="1" maxOccurs="1" name="GetLatestDateTimeResult" type="s:dateTime" />
          </s:sequence>
        </s:complexType>
      </s:element>
      <s:element name="Broken">
        <s:complexType />
      </s:element>
      <s:element name="Fail">
        <s:complexType />
      </s:element>
    </s:schema>
  </wsdl:types>
  <wsdl:binding name="DailyInfoSoap" type="tns:DailyInfoSoap">
    <soap:binding transport="http://schemas.xmlsoap.org/soap/http" />
    <wsdl:operation name="GetCursOnDate">
      <soap:operation soapAction="http://web.cbr.ru/GetCursOnDate" style="document" />
    </wsdl:operation>
    <wsdl:operation name="GetLatestDateTime">
      <soap:operation soapAction="http://web.cbr.ru/GetLatestDateTime" style="document" />
    </wsdl:operation>
    <wsdl:operation name="Broken">
      <soap:operation soapAction="http://web.cbr.ru/Broken" style="document" />
    </wsdl:operation>
    <wsdl:operation name="Fail">
      <soap:operation style="document" />
    </wsdl:operation>
  </wsdl:binding>
  <wsdl:service name="DailyInfo">
    <wsdl:port name="DailyInfoSoap" binding="tns:DailyInfoSoap">
      <soap:address location="{base_url}/DailyInfoWebServ/DailyInfo.asmx" />
    </wsdl:port>
  </wsdl:service>
</wsdl:definitions>"#;
