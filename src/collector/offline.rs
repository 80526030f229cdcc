//! Offline collector: everything that can be learned without the internet

use super::CollectContext;
use crate::command::CommandSpec;
use crate::defaults;
use crate::error::{AppError, Result};
use crate::merge::{Arena, PartialRecord, Source};
use crate::models::{is_wireless_port_label, ArpEntry, InterfaceRecord, LatencyResult, RouteEntry};
use crate::parsers::{
    parse_airport_info, parse_airport_scan, parse_arp, parse_dhcp_packet, parse_hardware_ports,
    parse_ifconfig, parse_interface_stats, parse_ping, parse_routes, parse_scutil_dns, HardwarePort,
};
use std::collections::BTreeMap;

/// `airport` is not on `PATH`
pub const AIRPORT_PATH: &str =
    "/System/Library/PrivateFrameworks/Apple80211.framework/Versions/Current/Resources/airport";

#[derive(Debug, Clone)]
pub struct OfflineOptions {
    pub skip_wifi_scan: bool,
    pub ping_count: u32,
}

impl Default for OfflineOptions {
    fn default() -> Self {
        Self {
            skip_wifi_scan: false,
            ping_count: defaults::DEFAULT_PING_COUNT,
        }
    }
}

pub struct OfflineCollector<'a> {
    ctx: &'a CollectContext,
    options: OfflineOptions,
}

impl<'a> OfflineCollector<'a> {
    pub fn new(ctx: &'a CollectContext, options: OfflineOptions) -> Self {
        Self { ctx, options }
    }

    /// Collect the local view of `interface`.
    ///
    /// Fails only when the interface does not exist. Cancellation stops the
    /// remaining steps and returns what was gathered so far.
    pub async fn collect(&self, interface: &str) -> Result<InterfaceRecord> {
        let mut arena = Arena::new();

        let ports = self.hardware_ports().await;
        let port = ports
            .as_ref()
            .and_then(|ports| ports.iter().find(|p| p.device == interface));
        if let Some(port) = port {
            arena.insert(interface, Source::HardwarePorts, PartialRecord::from(port));
        }

        let ifconfig = CommandSpec::new("ifconfig").arg(interface);
        let netstat = CommandSpec::new("netstat").args(["-I", interface, "-b"]);
        let routes = CommandSpec::new("netstat").arg("-rn");
        let scutil = CommandSpec::new("scutil").arg("--dns");
        let arp = CommandSpec::new("arp").args(["-a", "-i", interface]);
        let dhcp = CommandSpec::new("ipconfig").args(["getpacket", interface]);

        let (ifconfig_out, netstat_out, routes_out, scutil_out, arp_out, dhcp_out) = tokio::join!(
            self.ctx.run(ifconfig),
            self.ctx.run(netstat),
            self.ctx.run(routes),
            self.ctx.run(scutil),
            self.ctx.run(arp),
            self.ctx.run(dhcp),
        );

        let ifconfig_ran = ifconfig_out.as_ref().is_some_and(|out| out.is_success());
        if ports.is_some() && port.is_none() && !ifconfig_ran && !self.ctx.is_cancelled() {
            return Err(AppError::config(format!("Unknown interface '{}'", interface)));
        }

        if let Some(text) = ifconfig_out.as_ref().and_then(|out| out.stdout_if_success()) {
            let blocks = parse_ifconfig(text);
            if blocks.is_empty() {
                self.ctx.logger.log_extract_miss(Source::Ifconfig, interface).await;
            }
            for block in blocks {
                let name = block.name.clone();
                arena.insert(&name, Source::Ifconfig, PartialRecord::from(block));
            }
        }

        if let Some(text) = netstat_out.as_ref().and_then(|out| out.stdout_if_success()) {
            match parse_interface_stats(text) {
                Some(stats) => {
                    let name = stats.name.clone();
                    arena.insert(&name, Source::InterfaceStats, PartialRecord::from(stats));
                }
                None => self.ctx.logger.log_extract_miss(Source::InterfaceStats, interface).await,
            }
        }

        if let Some(text) = routes_out.as_ref().and_then(|out| out.stdout_if_success()) {
            for (name, routes) in group_by_interface(parse_routes(text), |r: &RouteEntry| &r.interface) {
                arena.insert(&name, Source::RoutingTable, PartialRecord::routing(routes));
            }
        }

        if let Some(text) = scutil_out.as_ref().and_then(|out| out.stdout_if_success()) {
            let servers = parse_scutil_dns(text).nameservers_for(interface);
            if servers.is_empty() {
                self.ctx.logger.log_extract_miss(Source::DnsConfig, interface).await;
            } else {
                arena.insert(interface, Source::DnsConfig, PartialRecord::dns(servers));
            }
        }

        if let Some(text) = arp_out.as_ref().and_then(|out| out.stdout_if_success()) {
            for (name, entries) in group_by_interface(parse_arp(text), |e: &ArpEntry| &e.interface) {
                arena.insert(&name, Source::ArpCache, PartialRecord::arp(entries));
            }
        }

        // Exits non-zero without a lease
        if let Some(text) = dhcp_out.as_ref().and_then(|out| out.stdout_if_success()) {
            match parse_dhcp_packet(text) {
                Some(lease) => {
                    arena.insert(interface, Source::Dhcp, PartialRecord::from(lease));
                }
                None => self.ctx.logger.log_extract_miss(Source::Dhcp, interface).await,
            }
        }

        // `airport -I` reports the association whatever device is asked
        // about, so devices missing from a good listing (lo0, utun*,
        // bridge0) are treated as wired
        let wireless_candidate = match (port, &ports) {
            (Some(port), _) => is_wireless_port_label(&port.port),
            (None, Some(_)) => false,
            (None, None) => true,
        };
        if wireless_candidate {
            self.collect_wifi(interface, &mut arena).await;
        }

        let gateway = arena.reduce(interface).default_gateway().map(str::to_string);
        if let Some(latency) = self.measure_latency(gateway.as_deref()).await {
            arena.insert(interface, Source::Ping, PartialRecord::from(latency));
        }

        Ok(arena.reduce(interface))
    }

    /// Hardware port listing, `None` when the listing itself failed
    async fn hardware_ports(&self) -> Option<Vec<HardwarePort>> {
        let spec = CommandSpec::new("networksetup").arg("-listallhardwareports");
        let output = self.ctx.run(spec).await?;
        let ports = parse_hardware_ports(output.stdout_if_success()?);
        (!ports.is_empty()).then_some(ports)
    }

    async fn collect_wifi(&self, interface: &str, arena: &mut Arena) {
        let info = CommandSpec::new(AIRPORT_PATH).arg("-I");
        let Some(output) = self.ctx.run(info).await else {
            return;
        };
        let Some(wifi) = output.stdout_if_success().and_then(parse_airport_info) else {
            self.ctx.logger.log_extract_miss(Source::WifiInfo, interface).await;
            return;
        };
        arena.insert(interface, Source::WifiInfo, PartialRecord::from(wifi));

        if self.options.skip_wifi_scan {
            return;
        }
        let scan = CommandSpec::new(AIRPORT_PATH).arg("-s");
        if let Some(text) = self.ctx.run(scan).await.as_ref().and_then(|out| out.stdout_if_success()) {
            arena.insert(
                interface,
                Source::WifiScan,
                PartialRecord::nearby_networks(parse_airport_scan(text)),
            );
        }
    }

    /// Ping the gateway, then the public anchor. The first target that
    /// answers at all wins.
    async fn measure_latency(&self, gateway: Option<&str>) -> Option<LatencyResult> {
        let targets = gateway.into_iter().chain(std::iter::once(defaults::PUBLIC_ANCHOR));

        for target in targets {
            let spec = CommandSpec::new("ping").args([
                "-c".to_string(),
                self.options.ping_count.to_string(),
                target.to_string(),
            ]);
            let output = self.ctx.run(spec).await?;
            let Some(text) = output.stdout_if_ran() else {
                continue;
            };
            match parse_ping(text, Some(target)) {
                Some(latency) if latency.reached() => return Some(latency),
                Some(_) => {}
                None => self.ctx.logger.log_extract_miss(Source::Ping, target).await,
            }
        }
        None
    }
}

/// Bucket rows by the interface named in each row, keeping row order
fn group_by_interface<T, F>(rows: Vec<T>, key: F) -> BTreeMap<String, Vec<T>>
where
    F: Fn(&T) -> &String,
{
    let mut groups: BTreeMap<String, Vec<T>> = BTreeMap::new();
    for row in rows {
        let name = key(&row).clone();
        groups.entry(name).or_default().push(row);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{CommandOutput, ReplayRunner};
    use crate::logging::CollectorLogger;
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;

    const PORTS: &str = "\
Hardware Port: Ethernet
Device: en7
Ethernet Address: 00:e0:4c:68:01:02

Hardware Port: Wi-Fi
Device: en0
Ethernet Address: a4:83:e7:00:11:22
";

    const IFCONFIG_EN0: &str = "\
en0: flags=8863<UP,BROADCAST,SMART,RUNNING,SIMPLEX,MULTICAST> mtu 1500
\toptions=6463<RXCSUM,TXCSUM,TSO4,TSO6,CHANNEL_IO,PARTIAL_CSUM,ZEROINVERT_CSUM>
\tether a4:83:e7:00:11:22
\tinet6 fe80::1c2b:3d4e:5f60:7182%en0 prefixlen 64 secured scopeid 0xe
\tinet 192.168.1.23 netmask 0xffffff00 broadcast 192.168.1.255
\tnd6 options=201<PERFORMNUD,DAD>
\tmedia: autoselect
\tstatus: active
";

    const NETSTAT_EN0: &str = "\
Name       Mtu   Network       Address            Ipkts Ierrs     Ibytes    Opkts Oerrs     Obytes  Coll
en0        1500  <Link#14>   a4:83:e7:00:11:22  1000000     0 1200000000   500000     0  300000000     0
en0        1500  192.168.1     192.168.1.23      999000     -  900000000   499000     -  200000000     -
";

    const ROUTES: &str = "\
Routing tables

Internet:
Destination        Gateway            Flags               Netif Expire
default            192.168.1.1        UGScg                 en0
127                127.0.0.1          UCS                   lo0
192.168.1          link#14            UCS                   en0      !
";

    const SCUTIL: &str = "\
DNS configuration

resolver #1
  nameserver[0] : 192.168.1.1
  if_index : 14 (en0)
  flags    : Request A records
  reach    : 0x00020002 (Reachable,Directly Reachable Address)
";

    const ARP: &str = "\
? (192.168.1.1) at 0:1b:2c:3:4:5 on en0 ifscope [ethernet]
? (192.168.1.40) at (incomplete) on en0 ifscope [ethernet]
";

    const AIRPORT_INFO: &str = "\
     agrCtlRSSI: -75
    agrCtlNoise: -90
     lastTxRate: 144
           SSID: HomeNetwork
          BSSID: a4:83:e7:12:34:56
        channel: 6
";

    const PING_GATEWAY: &str = "\
PING 192.168.1.1 (192.168.1.1): 56 data bytes
64 bytes from 192.168.1.1: icmp_seq=0 ttl=64 time=2.1 ms

--- 192.168.1.1 ping statistics ---
10 packets transmitted, 10 packets received, 0.0% packet loss
round-trip min/avg/max/stddev = 1.802/2.345/3.101/0.412 ms
";

    fn base_runner() -> ReplayRunner {
        ReplayRunner::new()
            .with_stdout("networksetup -listallhardwareports", PORTS)
            .with_stdout("ifconfig en0", IFCONFIG_EN0)
            .with_stdout("netstat -I en0 -b", NETSTAT_EN0)
            .with_stdout("netstat -rn", ROUTES)
            .with_stdout("scutil --dns", SCUTIL)
            .with_stdout("arp -a -i en0", ARP)
    }

    fn context(runner: Arc<ReplayRunner>) -> CollectContext {
        CollectContext::new(runner, CollectorLogger::silent(), CancellationToken::new())
    }

    #[tokio::test]
    async fn test_collects_wired_view() {
        let runner = Arc::new(
            base_runner().with_stdout("ping -c 10 192.168.1.1", PING_GATEWAY),
        );
        let ctx = context(runner.clone());
        let record = OfflineCollector::new(&ctx, OfflineOptions::default())
            .collect("en0")
            .await
            .unwrap();

        assert_eq!(record.hardware_port.as_deref(), Some("Wi-Fi"));
        assert_eq!(record.is_active, Some(true));
        assert_eq!(record.mtu, Some(1500));
        assert_eq!(record.ipv4_addresses, vec!["192.168.1.23"]);
        assert_eq!(record.counters.packets_in, Some(1_000_000));
        assert_eq!(record.default_gateway(), Some("192.168.1.1"));
        assert_eq!(record.dns, vec!["192.168.1.1"]);
        assert_eq!(record.arp_entries.len(), 1);

        let latency = record.latency.unwrap();
        assert_eq!(latency.target.as_deref(), Some("192.168.1.1"));
        assert_eq!(latency.packet_loss_percent(), Some(0.0));
        // The gateway answered, so the anchor is never pinged
        assert!(!runner.was_called("ping -c 10 1.1.1.1"));
    }

    #[tokio::test]
    async fn test_routes_of_other_interfaces_stay_out() {
        let ctx = context(Arc::new(base_runner()));
        let record = OfflineCollector::new(&ctx, OfflineOptions::default())
            .collect("en0")
            .await
            .unwrap();
        assert!(record.routing.iter().all(|route| route.interface == "en0"));
    }

    #[tokio::test]
    async fn test_collects_wifi_and_scan() {
        let scan = "
                            SSID BSSID             RSSI CHANNEL HT CC SECURITY (auth/unicast/group)
                     HomeNetwork a4:83:e7:12:34:56 -75  6        Y  US WPA2(PSK/AES/AES)
                        Neighbor 11:22:33:44:55:66 -80  6        Y  US WPA2(PSK/AES/AES)
";
        let runner = base_runner()
            .with_stdout(format!("{} -I", AIRPORT_PATH), AIRPORT_INFO)
            .with_stdout(format!("{} -s", AIRPORT_PATH), scan);
        let ctx = context(Arc::new(runner));

        let record = OfflineCollector::new(&ctx, OfflineOptions::default())
            .collect("en0")
            .await
            .unwrap();

        let wifi = record.wifi.unwrap();
        assert_eq!(wifi.snr(), Some(15));
        assert_eq!(wifi.nearby_networks.len(), 2);
        assert_eq!(wifi.co_channel_networks(), 1);
    }

    #[tokio::test]
    async fn test_skip_wifi_scan() {
        let runner = Arc::new(
            base_runner()
                .with_stdout(format!("{} -I", AIRPORT_PATH), AIRPORT_INFO)
                .with_stdout(format!("{} -s", AIRPORT_PATH), "irrelevant"),
        );
        let ctx = context(runner.clone());
        let options = OfflineOptions {
            skip_wifi_scan: true,
            ..Default::default()
        };

        let record = OfflineCollector::new(&ctx, options).collect("en0").await.unwrap();
        assert!(record.wifi.unwrap().nearby_networks.is_empty());
        assert!(!runner.was_called(&format!("{} -s", AIRPORT_PATH)));
    }

    #[tokio::test]
    async fn test_wired_port_never_runs_airport() {
        let runner = Arc::new(
            base_runner()
                .with_stdout("ifconfig en7", IFCONFIG_EN0.replace("en0", "en7"))
                .with_stdout(format!("{} -I", AIRPORT_PATH), AIRPORT_INFO),
        );
        let ctx = context(runner.clone());

        let record = OfflineCollector::new(&ctx, OfflineOptions::default())
            .collect("en7")
            .await
            .unwrap();
        assert_eq!(record.hardware_port.as_deref(), Some("Ethernet"));
        assert!(record.wifi.is_none());
        assert!(!runner.was_called(AIRPORT_PATH));
    }

    #[tokio::test]
    async fn test_unlisted_device_gets_no_wifi_association() {
        let utun = "\
utun3: flags=8051<UP,POINTOPOINT,RUNNING,MULTICAST> mtu 1380
\tinet 10.8.0.2 --> 10.8.0.1 netmask 0xffffffff
";
        let runner = Arc::new(
            base_runner()
                .with_stdout("ifconfig utun3", utun)
                .with_stdout(format!("{} -I", AIRPORT_PATH), AIRPORT_INFO),
        );
        let ctx = context(runner.clone());

        let record = OfflineCollector::new(&ctx, OfflineOptions::default())
            .collect("utun3")
            .await
            .unwrap();
        assert_eq!(record.hardware_port, None);
        assert!(record.wifi.is_none());
        assert!(!runner.was_called(AIRPORT_PATH));
        assert!(crate::health::assess(&record).warnings_in(crate::models::Area::Wifi).next().is_none());
    }

    #[tokio::test]
    async fn test_failed_port_listing_still_tries_wifi() {
        let runner = ReplayRunner::new()
            .with_stdout("ifconfig en0", IFCONFIG_EN0)
            .with_stdout(format!("{} -I", AIRPORT_PATH), AIRPORT_INFO);
        let ctx = context(Arc::new(runner));

        let record = OfflineCollector::new(&ctx, OfflineOptions::default())
            .collect("en0")
            .await
            .unwrap();
        assert_eq!(record.wifi.and_then(|wifi| wifi.rssi), Some(-75));
    }

    #[tokio::test]
    async fn test_falls_back_to_public_anchor() {
        let lost = "\
--- 192.168.1.1 ping statistics ---
10 packets transmitted, 0 packets received, 100.0% packet loss
";
        let anchor = "\
--- 1.1.1.1 ping statistics ---
10 packets transmitted, 7 packets received, 30.0% packet loss
round-trip min/avg/max/stddev = 10.1/12.4/20.9/3.2 ms
";
        let runner = base_runner()
            .with(
                "ping -c 10 192.168.1.1",
                CommandOutput {
                    stdout: lost.to_string(),
                    exit_code: Some(2),
                    ..Default::default()
                },
            )
            .with_stdout("ping -c 10 1.1.1.1", anchor);
        let ctx = context(Arc::new(runner));

        let record = OfflineCollector::new(&ctx, OfflineOptions::default())
            .collect("en0")
            .await
            .unwrap();
        let latency = record.latency.unwrap();
        assert_eq!(latency.target.as_deref(), Some("1.1.1.1"));
        assert_eq!(latency.packet_loss_percent(), Some(30.0));
    }

    #[tokio::test]
    async fn test_no_reply_leaves_latency_absent() {
        let ctx = context(Arc::new(base_runner()));
        let record = OfflineCollector::new(&ctx, OfflineOptions::default())
            .collect("en0")
            .await
            .unwrap();
        assert!(record.latency.is_none());
    }

    const DHCP_EN0: &str = "\
op = BOOTREPLY
yiaddr = 192.168.1.23
options:
Options count is 5
dhcp_message_type (uint8): ACK 0x5
server_identifier (ip): 192.168.1.1
lease_time (uint32): 0x15180
subnet_mask (ip): 255.255.255.0
router (ip_mult): {192.168.1.1}
end (none):
";

    #[tokio::test]
    async fn test_dhcp_lease_is_collected() {
        let runner = Arc::new(base_runner().with_stdout("ipconfig getpacket en0", DHCP_EN0));
        let ctx = context(runner);
        let record = OfflineCollector::new(&ctx, OfflineOptions::default())
            .collect("en0")
            .await
            .unwrap();

        let dhcp = record.dhcp.unwrap();
        assert_eq!(dhcp.server.as_deref(), Some("192.168.1.1"));
        assert_eq!(dhcp.lease_time_secs, Some(86400));
        assert_eq!(dhcp.subnet_mask.as_deref(), Some("255.255.255.0"));
    }

    #[tokio::test]
    async fn test_dhcp_router_is_pinged_without_default_route() {
        let runner = Arc::new(
            ReplayRunner::new()
                .with_stdout("networksetup -listallhardwareports", PORTS)
                .with_stdout("ifconfig en0", IFCONFIG_EN0)
                .with_stdout("ipconfig getpacket en0", DHCP_EN0)
                .with_stdout("ping -c 10 192.168.1.1", PING_GATEWAY),
        );
        let ctx = context(runner.clone());
        let record = OfflineCollector::new(&ctx, OfflineOptions::default())
            .collect("en0")
            .await
            .unwrap();

        assert!(record.routing.is_empty());
        assert_eq!(record.default_gateway(), Some("192.168.1.1"));
        assert_eq!(record.latency.unwrap().target.as_deref(), Some("192.168.1.1"));
        assert!(!runner.was_called("ping -c 10 1.1.1.1"));
    }

    #[tokio::test]
    async fn test_static_interface_has_no_dhcp() {
        let runner = Arc::new(base_runner().with(
            "ipconfig getpacket en0",
            CommandOutput {
                exit_code: Some(1),
                ..Default::default()
            },
        ));
        let ctx = context(runner);
        let record = OfflineCollector::new(&ctx, OfflineOptions::default())
            .collect("en0")
            .await
            .unwrap();
        assert!(record.dhcp.is_none());
    }

    #[tokio::test]
    async fn test_unknown_interface_is_config_error() {
        let ctx = context(Arc::new(base_runner().with(
            "ifconfig en9",
            CommandOutput::failed(1, "ifconfig: interface en9 does not exist"),
        )));
        let error = OfflineCollector::new(&ctx, OfflineOptions::default())
            .collect("en9")
            .await
            .unwrap_err();
        assert_eq!(error.category(), "CONFIG");
    }

    #[tokio::test]
    async fn test_missing_tools_leave_fields_absent() {
        let ctx = context(Arc::new(ReplayRunner::new()));
        let record = OfflineCollector::new(&ctx, OfflineOptions::default())
            .collect("en0")
            .await
            .unwrap();
        assert_eq!(record, InterfaceRecord::empty("en0"));
    }

    #[tokio::test]
    async fn test_cancelled_run_returns_partial_record() {
        let ctx = context(Arc::new(base_runner()));
        ctx.token.cancel();
        let record = OfflineCollector::new(&ctx, OfflineOptions::default())
            .collect("en0")
            .await
            .unwrap();
        assert_eq!(record, InterfaceRecord::empty("en0"));
    }
}
