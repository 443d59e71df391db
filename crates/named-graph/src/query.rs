use named_types::model::graph::ZoneSummary;

/// Criteria for picking out zones.  Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZoneFilter {
    /// Exact server name.
    pub server: Option<String>,
    /// Exact raw type: `primary` does not match `master`.
    pub zone_type: Option<String>,
    /// Case-insensitive substring of the zone name.
    pub name: Option<String>,
}

impl ZoneFilter {
    pub fn matches(&self, zone: &ZoneSummary) -> bool {
        if let Some(server) = &self.server {
            if zone.server != *server {
                return false;
            }
        }
        if let Some(zone_type) = &self.zone_type {
            if zone.zone_type != *zone_type {
                return false;
            }
        }
        if let Some(name) = &self.name {
            if !zone.name.to_lowercase().contains(&name.to_lowercase()) {
                return false;
            }
        }
        true
    }
}

pub fn filter_zones<'a>(zones: &'a [ZoneSummary], filter: &ZoneFilter) -> Vec<&'a ZoneSummary> {
    zones.iter().filter(|zone| filter.matches(zone)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filter_matches_everything() {
        let zones = zones();

        assert_eq!(3, filter_zones(&zones, &ZoneFilter::default()).len());
    }

    #[test]
    fn filter_by_server_and_type() {
        let zones = zones();
        let filter = ZoneFilter {
            server: Some("ns1".to_string()),
            zone_type: Some("master".to_string()),
            ..ZoneFilter::default()
        };

        assert_eq!(
            vec!["Example.com"],
            filter_zones(&zones, &filter)
                .iter()
                .map(|z| z.name.as_str())
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn filter_type_is_not_normalised() {
        let zones = zones();
        let filter = ZoneFilter {
            zone_type: Some("slave".to_string()),
            ..ZoneFilter::default()
        };

        assert!(filter_zones(&zones, &filter).is_empty());
    }

    #[test]
    fn filter_by_name_ignores_case() {
        let zones = zones();
        let filter = ZoneFilter {
            name: Some("EXAMPLE".to_string()),
            ..ZoneFilter::default()
        };

        assert_eq!(2, filter_zones(&zones, &filter).len());
    }

    fn zones() -> Vec<ZoneSummary> {
        vec![
            zone("Example.com", "master", "ns1"),
            zone("example.org", "secondary", "ns2"),
            zone("other.net", "forward", "ns1"),
        ]
    }

    fn zone(name: &str, zone_type: &str, server: &str) -> ZoneSummary {
        ZoneSummary {
            name: name.to_string(),
            zone_type: zone_type.to_string(),
            server: server.to_string(),
            view: None,
        }
    }
}
