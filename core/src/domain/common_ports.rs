//! Well-known development ports.

/// Ports commonly used by local development servers, with the tools
/// that usually own them.
pub const COMMON_PORTS: [(u16, &str); 12] = [
    (3000, "React, Node.js"),
    (3001, "React alternate"),
    (4200, "Angular"),
    (5000, "Flask, ASP.NET"),
    (5173, "Vite"),
    (5174, "Vite alternate"),
    (8000, "Django, Python"),
    (8080, "Tomcat, Spring"),
    (8081, "Alternate HTTP"),
    (8888, "Jupyter"),
    (9000, "PHP-FPM"),
    (9090, "Prometheus"),
];

/// Look up the label of a well-known development port.
pub fn common_port_label(port: u16) -> Option<&'static str> {
    COMMON_PORTS
        .iter()
        .find(|(p, _)| *p == port)
        .map(|(_, label)| *label)
}
