//! Sea areas covering Norwegian waters, used to discover vessels for the
//! historic download. Rings are closed `[lon, lat]` polygons.

/// A named polygon for `mmsiinarea` queries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Area {
    pub name: &'static str,
    pub ring: &'static [[f64; 2]],
}

pub const NORWAY_AREAS: &[Area] = &[
    Area {
        name: "oslofjord",
        ring: &[
            [10.78513402370703, 60.04379058117593],
            [8.485531852850272, 58.39420052653966],
            [11.916990764085625, 57.99527628511697],
            [10.78513402370703, 60.04379058117593],
        ],
    },
    Area {
        name: "kristiansand",
        ring: &[
            [8.788368985577478, 58.45856375238054],
            [7.402608851068976, 58.097568609887674],
            [5.205595635308214, 59.5310111553066],
            [4.55864740243436, 58.049283977921164],
            [7.20790355532597, 57.37263176906313],
            [9.066301644869213, 57.715026939005014],
            [11.135700681029675, 58.06657367224307],
            [8.788368985577478, 58.45856375238054],
        ],
    },
    Area {
        name: "bergen",
        ring: &[
            [4.6321728329088785, 58.04890895224662],
            [5.761107517734729, 60.30826803703246],
            [5.681307155682532, 62.386568767188464],
            [1.9260540592790107, 62.67776718981398],
            [3.0723122559526246, 58.416766407950746],
            [4.6321728329088785, 58.04890895224662],
        ],
    },
    Area {
        name: "trondheim",
        ring: &[
            [6.796506215553421, 61.93767633492155],
            [11.503743066105784, 63.58097410048643],
            [14.791179837684268, 66.09504181342487],
            [8.804768906126242, 67.8189857381185],
            [1.8414412798037176, 62.578987087184686],
            [6.796506215553421, 61.93767633492155],
        ],
    },
    Area {
        name: "tromso",
        ring: &[
            [13.810483752093603, 66.43955348356758],
            [26.396269200113153, 71.04012248863856],
            [22.71800778191661, 74.1531163819613],
            [8.741433850611514, 67.80319094612682],
            [13.810483752093603, 66.43955348356758],
        ],
    },
    Area {
        name: "kirkenes",
        ring: &[
            [25.588095993156713, 69.90444227909268],
            [35.400112953391414, 68.92683633946493],
            [40.89486387325269, 71.28390007220128],
            [22.377837588569946, 74.16061101130416],
            [25.588095993156713, 69.90444227909268],
        ],
    },
    Area {
        name: "svalbard",
        ring: &[
            [10.157534116271336, 75.8238393574249],
            [31.157552478958053, 76.15256213539797],
            [40.95139600732108, 81.67326805583411],
            [-3.6363860380758126, 82.09089410875563],
            [10.157534116271336, 75.8238393574249],
        ],
    },
    Area {
        name: "towards_svalbard",
        ring: &[
            [10.286234445195845, 75.80107897451381],
            [14.385918334661511, 70.77752104452009],
            [29.225915286853052, 73.17210224387776],
            [31.40794841353042, 76.29976102841684],
            [10.286234445195845, 75.80107897451381],
        ],
    },
];

/// Look up an area by name.
pub fn find_area(name: &str) -> Option<&'static Area> {
    NORWAY_AREAS.iter().find(|area| area.name == name)
}
