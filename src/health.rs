//! Health assessment engine
//!
//! Grades an [`InterfaceRecord`] with a composite score. The score starts at
//! 100 and every metric may take off points through at most one band: the
//! most severe band whose condition holds. Absent data never costs points.

use crate::models::{
    Area, Deduction, HealthAssessment, HealthCategory, HealthWarning, InterfaceRecord, Severity, WifiBand,
};

const MOVE_CLOSER: &str = "Move closer to the access point or add a mesh node / extender";
const CHECK_PHYSICAL: &str = "Check the cable, port and driver; interface errors point to a physical-layer fault";
const CHECK_DUPLEX: &str = "Collisions suggest a duplex mismatch; force full duplex on both ends";
const CONNECT: &str = "Connect the cable or join a network; the interface is not active";
const REDUCE_INTERFERENCE: &str = "Reduce interference: move away from microwaves, Bluetooth hubs and thick walls";
const CHANGE_CHANNEL: &str = "Switch the access point to a less crowded channel or to the 5 GHz band";
const INVESTIGATE_LOSS: &str = "Investigate packet loss: check cabling, WiFi interference and the ISP line";
const REDUCE_LATENCY: &str = "High latency: look for congested links or bufferbloat on the router";
const STABILIZE_LATENCY: &str = "Unstable latency: pause large transfers and enable SQM / QoS on the router";
const CHECK_PLAN: &str = "Throughput is low: compare with your subscribed plan and test over a cable";
const ENABLE_SQM: &str = "Low responsiveness indicates bufferbloat; enable SQM / QoS on the router";
const CHECK_PATH: &str = "Many TCP retransmissions: check for a lossy hop between this host and the iperf3 server";
const CHANGE_RESOLVER: &str = "Consider a different DNS resolver such as 1.1.1.1 or 9.9.9.9";

/// One band of one metric that fired
struct Finding {
    severity: Severity,
    points: u8,
    message: String,
    recommendation: Option<&'static str>,
}

impl Finding {
    fn new(severity: Severity, points: u8, message: String) -> Self {
        Self {
            severity,
            points,
            message,
            recommendation: None,
        }
    }

    fn recommend(mut self, recommendation: &'static str) -> Self {
        self.recommendation = Some(recommendation);
        self
    }
}

/// Collects findings into an assessment
#[derive(Default)]
struct Scorer {
    warnings: Vec<HealthWarning>,
    deductions: Vec<Deduction>,
    recommendations: Vec<String>,
}

impl Scorer {
    fn apply(&mut self, area: Area, finding: Option<Finding>) {
        let Some(finding) = finding else {
            return;
        };

        if finding.points > 0 {
            self.deductions.push(Deduction {
                area,
                points: finding.points,
                reason: finding.message.clone(),
            });
        }
        if let Some(recommendation) = finding.recommendation {
            if !self.recommendations.iter().any(|r| r == recommendation) {
                self.recommendations.push(recommendation.to_string());
            }
        }
        self.warnings.push(HealthWarning {
            severity: finding.severity,
            area,
            message: finding.message,
        });
    }

    fn finish(self) -> HealthAssessment {
        let deducted: u32 = self.deductions.iter().map(|d| u32::from(d.points)).sum();
        let score = 100u32.saturating_sub(deducted) as u8;

        HealthAssessment {
            score,
            category: HealthCategory::from_score(score),
            warnings: self.warnings,
            recommendations: self.recommendations,
            deductions: self.deductions,
        }
    }
}

/// Grade a record. Pure and deterministic.
pub fn assess(record: &InterfaceRecord) -> HealthAssessment {
    let mut scorer = Scorer::default();

    assess_interface(record, &mut scorer);
    assess_wifi(record, &mut scorer);
    assess_latency(record, &mut scorer);
    assess_online(record, &mut scorer);

    scorer.finish()
}

fn assess_interface(record: &InterfaceRecord, scorer: &mut Scorer) {
    let counters = &record.counters;

    scorer.apply(
        Area::Interface,
        counters.error_rate_percent().and_then(|rate| {
            let finding = if rate >= 1.0 {
                Finding::new(Severity::Critical, 20, format!("High interface error rate: {:.2}%", rate))
            } else if rate >= 0.1 {
                Finding::new(Severity::Warning, 10, format!("Elevated interface error rate: {:.2}%", rate))
            } else {
                return None;
            };
            Some(finding.recommend(CHECK_PHYSICAL))
        }),
    );

    scorer.apply(
        Area::Interface,
        counters.collisions.filter(|c| *c > 0).map(|collisions| {
            Finding::new(Severity::Warning, 5, format!("{} collisions on the interface", collisions))
                .recommend(CHECK_DUPLEX)
        }),
    );

    scorer.apply(
        Area::Interface,
        (record.is_active == Some(false)).then(|| {
            Finding::new(Severity::Critical, 30, format!("Interface {} is inactive", record.name)).recommend(CONNECT)
        }),
    );
}

fn assess_wifi(record: &InterfaceRecord, scorer: &mut Scorer) {
    let Some(wifi) = &record.wifi else {
        return;
    };

    let rssi_reliable = wifi.rssi_is_reliable();
    scorer.apply(
        Area::Wifi,
        wifi.rssi.and_then(|rssi| {
            if rssi_reliable == Some(false) {
                return Some(Finding::new(
                    Severity::Info,
                    0,
                    format!("RSSI reading {} dBm is outside the valid range and was ignored", rssi),
                ));
            }
            let finding = if rssi < -80 {
                Finding::new(Severity::Critical, 25, format!("Very weak WiFi signal: {} dBm", rssi))
            } else if rssi < -70 {
                Finding::new(Severity::Warning, 15, format!("Weak WiFi signal: {} dBm", rssi))
            } else if rssi < -60 {
                Finding::new(Severity::Info, 5, format!("Fair WiFi signal: {} dBm", rssi))
            } else {
                return None;
            };
            Some(finding.recommend(MOVE_CLOSER))
        }),
    );

    // An out-of-range RSSI makes the SNR meaningless as well
    if rssi_reliable != Some(false) {
        scorer.apply(
            Area::Wifi,
            wifi.snr().and_then(|snr| {
                let finding = if snr < 20 {
                    Finding::new(Severity::Critical, 20, format!("Poor SNR: {} dB (below 20 dB)", snr))
                } else if snr < 30 {
                    Finding::new(Severity::Warning, 10, format!("Poor SNR: {} dB", snr))
                } else {
                    return None;
                };
                Some(finding.recommend(MOVE_CLOSER))
            }),
        );
    }

    scorer.apply(
        Area::Wifi,
        wifi.tx_rate_mbps.filter(|rate| *rate < 50).map(|rate| {
            Finding::new(Severity::Warning, 5, format!("Low WiFi transmit rate: {} Mbps", rate))
                .recommend(REDUCE_INTERFERENCE)
        }),
    );

    let co_channel = wifi.co_channel_networks();
    scorer.apply(
        Area::Wifi,
        (wifi.band() == Some(WifiBand::Band2_4GHz) && co_channel >= 5).then(|| {
            Finding::new(
                Severity::Info,
                3,
                format!("{} other networks share 2.4 GHz channel {}", co_channel, wifi.channel.unwrap_or_default()),
            )
            .recommend(CHANGE_CHANNEL)
        }),
    );
}

fn assess_latency(record: &InterfaceRecord, scorer: &mut Scorer) {
    let Some(latency) = &record.latency else {
        return;
    };
    let target = latency.target.as_deref().unwrap_or("target");

    scorer.apply(
        Area::Latency,
        latency.packet_loss_percent().and_then(|loss| {
            let finding = if loss >= 5.0 {
                Finding::new(Severity::Critical, 30, format!("Severe packet loss to {}: {:.1}%", target, loss))
            } else if loss >= 1.0 {
                Finding::new(Severity::Warning, 15, format!("Packet loss to {}: {:.1}%", target, loss))
            } else if loss > 0.0 {
                Finding::new(Severity::Info, 5, format!("Minor packet loss to {}: {:.1}%", target, loss))
            } else {
                return None;
            };
            Some(finding.recommend(INVESTIGATE_LOSS))
        }),
    );

    let Some(rtt) = latency.rtt else {
        return;
    };

    let average = if rtt.avg_ms > 100.0 {
        Some(Finding::new(Severity::Warning, 15, format!("High latency to {}: {:.1} ms", target, rtt.avg_ms)))
    } else if rtt.avg_ms > 50.0 {
        Some(Finding::new(Severity::Info, 5, format!("Elevated latency to {}: {:.1} ms", target, rtt.avg_ms)))
    } else {
        None
    };
    scorer.apply(Area::Latency, average.map(|f| f.recommend(REDUCE_LATENCY)));

    let jitter = if rtt.jitter_ms > 20.0 {
        Some(Finding::new(Severity::Warning, 10, format!("High jitter: {:.1} ms", rtt.jitter_ms)))
    } else if rtt.jitter_ms > 10.0 {
        Some(Finding::new(Severity::Info, 5, format!("Noticeable jitter: {:.1} ms", rtt.jitter_ms)))
    } else {
        None
    };
    scorer.apply(Area::Latency, jitter.map(|f| f.recommend(STABILIZE_LATENCY)));
}

fn assess_online(record: &InterfaceRecord, scorer: &mut Scorer) {
    let Some(online) = &record.online else {
        return;
    };

    scorer.apply(
        Area::Speed,
        online.download_mbps().and_then(|mbps| {
            let finding = if mbps < 10.0 {
                Finding::new(Severity::Warning, 15, format!("Slow download: {:.1} Mbps", mbps))
            } else if mbps < 25.0 {
                Finding::new(Severity::Info, 5, format!("Modest download: {:.1} Mbps", mbps))
            } else {
                return None;
            };
            Some(finding.recommend(CHECK_PLAN))
        }),
    );

    scorer.apply(
        Area::Speed,
        online.upload_mbps().filter(|mbps| *mbps < 5.0).map(|mbps| {
            Finding::new(Severity::Warning, 10, format!("Slow upload: {:.1} Mbps", mbps)).recommend(CHECK_PLAN)
        }),
    );

    scorer.apply(
        Area::Speed,
        online.responsiveness_rpm().filter(|rpm| *rpm < 200.0).map(|rpm| {
            Finding::new(Severity::Warning, 10, format!("Low responsiveness under load: {:.0} RPM", rpm))
                .recommend(ENABLE_SQM)
        }),
    );

    if let Some(bandwidth) = &online.bandwidth_test {
        let worst = [bandwidth.upload_retransmits, bandwidth.download_retransmits]
            .into_iter()
            .flatten()
            .max();
        scorer.apply(
            Area::Bandwidth,
            worst.filter(|r| *r > 100).map(|retransmits| {
                Finding::new(
                    Severity::Info,
                    3,
                    format!("{} TCP retransmits during the bandwidth test", retransmits),
                )
                .recommend(CHECK_PATH)
            }),
        );
    }

    if let Some(dns) = &online.dns_test {
        scorer.apply(
            Area::Dns,
            dns.success_rate().and_then(|rate| {
                let finding = if rate < 90.0 {
                    Finding::new(
                        Severity::Critical,
                        20,
                        format!("Unreliable DNS via {}: {:.0}% of lookups succeeded", dns.resolver, rate),
                    )
                } else if rate < 99.0 {
                    Finding::new(
                        Severity::Warning,
                        10,
                        format!("Some DNS lookups via {} failed: {:.0}% succeeded", dns.resolver, rate),
                    )
                } else {
                    return None;
                };
                Some(finding.recommend(CHANGE_RESOLVER))
            }),
        );

        scorer.apply(
            Area::Dns,
            dns.avg_ms.filter(|ms| *ms > 100.0).map(|ms| {
                Finding::new(Severity::Warning, 5, format!("Slow DNS lookups: {:.0} ms average", ms))
                    .recommend(CHANGE_RESOLVER)
            }),
        );
    }
}
